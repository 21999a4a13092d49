//! Overlay resolver: text policy -> exactly N overlay strings.

use tracing::{info, warn};

use reel_models::{TextInput, TextStrategy, DEFAULT_OVERLAY_TEXT};

use crate::error::{TextGenError, TextGenResult};
use crate::generator::TextVariationGenerator;

/// Attempts beyond the first call to the variation capability.
const VARIATION_RETRIES: u32 = 2;

/// Resolve a text policy to exactly `count` overlay strings, in order.
///
/// Never fails: the BaseVary path degrades to OneForAll replication after
/// the retry budget, so a flapping language model can delay a job but not
/// kill it.
pub async fn resolve_overlays(
    input: &TextInput,
    count: u32,
    generator: &dyn TextVariationGenerator,
) -> Vec<String> {
    let count = count.max(1);

    match input.strategy {
        TextStrategy::OneForAll => {
            let text = input.base_or_default().to_string();
            vec![text; count as usize]
        }

        TextStrategy::UniqueForAll => {
            let mut texts = input.unique_texts.clone().unwrap_or_default();
            texts.retain(|t| !t.is_empty());

            if texts.is_empty() {
                return vec![DEFAULT_OVERLAY_TEXT.to_string(); count as usize];
            }

            // Right-pad by repeating the last element, then truncate.
            let last = texts.last().cloned().unwrap_or_default();
            while (texts.len() as u32) < count {
                texts.push(last.clone());
            }
            texts.truncate(count as usize);
            texts
        }

        TextStrategy::BaseVary => {
            let base_text = input.base_or_default().to_string();
            let context = input.context.as_deref();

            for attempt in 0..=VARIATION_RETRIES {
                match try_variations(&base_text, count, context, generator).await {
                    Ok(variations) => {
                        info!(count, "Resolved overlays via language model");
                        return variations;
                    }
                    Err(e) => {
                        warn!(
                            attempt = attempt + 1,
                            "Variation generation failed: {}", e
                        );
                    }
                }
            }

            warn!("Variation retries exhausted, falling back to replicated base text");
            vec![base_text; count as usize]
        }
    }
}

/// One capability call plus contract validation.
async fn try_variations(
    base_text: &str,
    count: u32,
    context: Option<&str>,
    generator: &dyn TextVariationGenerator,
) -> TextGenResult<Vec<String>> {
    let variations = generator
        .generate_variations(base_text, count, context)
        .await?;

    if variations.len() != count as usize {
        return Err(TextGenError::contract(format!(
            "expected {} strings, got {}",
            count,
            variations.len()
        )));
    }
    if variations[0] != base_text {
        return Err(TextGenError::contract(
            "first element does not equal the base text",
        ));
    }
    if variations.iter().any(|v| v.is_empty()) {
        return Err(TextGenError::contract("empty variation"));
    }

    Ok(variations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Generator that fulfills the contract.
    struct OkGenerator;

    #[async_trait]
    impl TextVariationGenerator for OkGenerator {
        async fn generate_variations(
            &self,
            base_text: &str,
            count: u32,
            _context: Option<&str>,
        ) -> TextGenResult<Vec<String>> {
            let mut result = vec![base_text.to_string()];
            for i in 1..count {
                result.push(format!("{} v{}", base_text, i));
            }
            Ok(result)
        }
    }

    /// Generator that errors on every call, counting attempts.
    struct FailingGenerator {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TextVariationGenerator for FailingGenerator {
        async fn generate_variations(
            &self,
            _base_text: &str,
            _count: u32,
            _context: Option<&str>,
        ) -> TextGenResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TextGenError::request_failed("503"))
        }
    }

    /// Generator that violates the first-element contract.
    struct WrongFirstGenerator;

    #[async_trait]
    impl TextVariationGenerator for WrongFirstGenerator {
        async fn generate_variations(
            &self,
            _base_text: &str,
            count: u32,
            _context: Option<&str>,
        ) -> TextGenResult<Vec<String>> {
            Ok(vec!["not the base".to_string(); count as usize])
        }
    }

    #[tokio::test]
    async fn one_for_all_replicates_base() {
        let result =
            resolve_overlays(&TextInput::one_for_all("Hello"), 4, &OkGenerator).await;
        assert_eq!(result, vec!["Hello"; 4]);
    }

    #[tokio::test]
    async fn one_for_all_without_base_uses_fallback_literal() {
        let input = TextInput {
            strategy: TextStrategy::OneForAll,
            ..Default::default()
        };
        let result = resolve_overlays(&input, 3, &OkGenerator).await;
        assert_eq!(result, vec![DEFAULT_OVERLAY_TEXT; 3]);
    }

    #[tokio::test]
    async fn unique_for_all_pads_with_last_element() {
        let input = TextInput::unique_for_all(vec!["a".into(), "b".into()]);
        let result = resolve_overlays(&input, 5, &OkGenerator).await;
        assert_eq!(result, vec!["a", "b", "b", "b", "b"]);
    }

    #[tokio::test]
    async fn unique_for_all_truncates_extra_texts() {
        let input =
            TextInput::unique_for_all(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let result = resolve_overlays(&input, 2, &OkGenerator).await;
        assert_eq!(result, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unique_for_all_empty_list_yields_fallback_copies() {
        let input = TextInput::unique_for_all(vec![]);
        let result = resolve_overlays(&input, 3, &OkGenerator).await;
        assert_eq!(result, vec![DEFAULT_OVERLAY_TEXT; 3]);
    }

    #[tokio::test]
    async fn base_vary_returns_model_output_with_base_first() {
        let input = TextInput::base_vary("Buy now", Some("sales".into()));
        let result = resolve_overlays(&input, 3, &OkGenerator).await;
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], "Buy now");
        assert!(result.iter().all(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn base_vary_falls_back_after_retry_budget() {
        let generator = FailingGenerator {
            calls: AtomicU32::new(0),
        };
        let input = TextInput::base_vary("Buy now", None);
        let result = resolve_overlays(&input, 4, &generator).await;

        // Initial attempt plus two retries, then replicated base text.
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result, vec!["Buy now"; 4]);
    }

    #[tokio::test]
    async fn base_vary_rejects_contract_violations() {
        let input = TextInput::base_vary("Buy now", None);
        let result = resolve_overlays(&input, 3, &WrongFirstGenerator).await;
        // Violation on every attempt -> fallback.
        assert_eq!(result, vec!["Buy now"; 3]);
    }

    #[tokio::test]
    async fn resolver_always_returns_exactly_n() {
        for n in 1..=6 {
            let result =
                resolve_overlays(&TextInput::base_vary("X", None), n, &OkGenerator).await;
            assert_eq!(result.len(), n as usize);
        }
    }
}
