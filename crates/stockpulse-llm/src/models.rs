//! Static model roster for rotation.

/// One configured LLM backend model.
///
/// The roster is a plain ordered list — rotation walks it by `priority`
/// (lowest first), trying each model at most once per batch. No provider
/// hierarchy; every entry goes through the same
/// [`crate::CompletionBackend::complete`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Provider-qualified model id, e.g. `deepseek/deepseek-chat-v3.1:free`.
    pub id: String,
    /// Short name for logs and reports (the segment after the provider).
    pub display_name: String,
    /// Advertised context window in tokens.
    pub context_window: u32,
    /// Rotation order; lower is tried first.
    pub priority: u8,
}

impl ModelDescriptor {
    /// Build a descriptor, deriving `display_name` from the id's last
    /// path segment.
    #[must_use]
    pub fn new(id: &str, context_window: u32, priority: u8) -> Self {
        let display_name = id
            .rsplit('/')
            .next()
            .unwrap_or(id)
            .trim_end_matches(":free")
            .to_owned();
        Self {
            id: id.to_owned(),
            display_name,
            context_window,
            priority,
        }
    }
}

/// Default rotation roster: free-tier models ordered preferred-first.
///
/// All entries advertise a context window comfortably above the 98K-token
/// batch ceiling.
#[must_use]
pub fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("deepseek/deepseek-chat-v3.1:free", 163_840, 0),
        ModelDescriptor::new("meta-llama/llama-3.3-8b-instruct:free", 128_000, 1),
        ModelDescriptor::new("qwen/qwen3-coder:free", 262_144, 2),
        ModelDescriptor::new("mistralai/mistral-small-3.2-24b-instruct:free", 131_072, 3),
        ModelDescriptor::new("z-ai/glm-4.5-air:free", 131_072, 4),
        ModelDescriptor::new("google/gemini-2.0-flash-exp:free", 1_048_576, 5),
        ModelDescriptor::new("meta-llama/llama-4-scout:free", 128_000, 6),
        ModelDescriptor::new("mistralai/mistral-nemo:free", 131_072, 7),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_last_segment_without_free_suffix() {
        let m = ModelDescriptor::new("deepseek/deepseek-chat-v3.1:free", 163_840, 0);
        assert_eq!(m.display_name, "deepseek-chat-v3.1");
    }

    #[test]
    fn display_name_of_unqualified_id_is_the_id() {
        let m = ModelDescriptor::new("local-model", 8192, 0);
        assert_eq!(m.display_name, "local-model");
    }

    #[test]
    fn default_roster_is_ordered_by_priority() {
        let models = default_models();
        assert!(!models.is_empty());
        for pair in models.windows(2) {
            assert!(
                pair[0].priority < pair[1].priority,
                "roster must be strictly priority-ordered"
            );
        }
    }

    #[test]
    fn default_roster_windows_exceed_batch_ceiling() {
        for m in default_models() {
            assert!(m.context_window >= 100_000, "{} window too small", m.id);
        }
    }
}
