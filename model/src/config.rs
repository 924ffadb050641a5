//! Configuration for a model.

/// What happens to existing tagged values when a stereotype attribute
/// default is declared or redefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaggedDefaultPolicy {
    /// Overwrite the tagged value on every current instance.
    #[default]
    Overwrite,
    /// Keep values that were set explicitly through the tagged-value API.
    PreserveExplicit,
}

/// Configuration for a model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Prefix for auto-generated metaclass names
    pub metaclass_prefix: String,
    /// Prefix for auto-generated class names
    pub class_prefix: String,
    /// Prefix for auto-generated stereotype names
    pub stereotype_prefix: String,
    /// Prefix for auto-generated object names
    pub object_prefix: String,
    /// Prefix for auto-generated enumeration names
    pub enum_prefix: String,
    /// Reject superclass edges that close a cycle of any length
    pub reject_hierarchy_cycles: bool,
    /// Propagation of redefined stereotype defaults
    pub tagged_default_policy: TaggedDefaultPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            metaclass_prefix: "Metaclass".to_string(),
            class_prefix: "Class".to_string(),
            stereotype_prefix: "Stereotype".to_string(),
            object_prefix: "Object".to_string(),
            enum_prefix: "Enum".to_string(),
            reject_hierarchy_cycles: true,
            tagged_default_policy: TaggedDefaultPolicy::Overwrite,
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metaclass_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metaclass_prefix = prefix.into();
        self
    }

    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    pub fn with_stereotype_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stereotype_prefix = prefix.into();
        self
    }

    pub fn with_object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = prefix.into();
        self
    }

    pub fn with_enum_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.enum_prefix = prefix.into();
        self
    }

    pub fn with_reject_hierarchy_cycles(mut self, reject: bool) -> Self {
        self.reject_hierarchy_cycles = reject;
        self
    }

    pub fn with_tagged_default_policy(mut self, policy: TaggedDefaultPolicy) -> Self {
        self.tagged_default_policy = policy;
        self
    }
}
