//! Extraction prompt templating.

/// Separator between item texts inside one batch prompt.
pub const ITEM_SEPARATOR: &str = "\n\n---POST SEPARATOR---\n\n";

/// Build the aggregated extraction prompt for one batch.
///
/// The output contract asks for one JSON object per ticker with aggregated
/// mention counts and an average numeric sentiment in `[-1, 1]`; the parser
/// in [`crate::parse`] accepts exactly this shape plus best-effort salvage.
#[must_use]
pub fn build_extraction_prompt(texts: &[String]) -> String {
    let joined = texts.join(ITEM_SEPARATOR);
    format!(
        "Extract stock tickers and sentiment from {count} Reddit posts below.\n\
         \n\
         RULES:\n\
         1. Only real stock tickers (AAPL, TSLA, etc) - ignore common words\n\
         2. Aggregate mentions across all posts\n\
         3. Calculate average sentiment per ticker: -1 (very negative) to +1 (very positive)\n\
         4. Label each ticker positive, neutral or negative\n\
         \n\
         POSTS:\n\
         {joined}\n\
         \n\
         OUTPUT (concise JSON only):\n\
         {{\n\
           \"tickers\": {{\n\
             \"AAPL\": {{\"mentions\": 3, \"sentiment\": 0.7, \"label\": \"positive\"}},\n\
             \"TSLA\": {{\"mentions\": 5, \"sentiment\": -0.2, \"label\": \"negative\"}}\n\
           }}\n\
         }}",
        count = texts.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_count_and_texts() {
        let texts = vec!["NVDA is on fire".to_string(), "selling my AAPL".to_string()];
        let prompt = build_extraction_prompt(&texts);
        assert!(prompt.contains("from 2 Reddit posts"));
        assert!(prompt.contains("NVDA is on fire"));
        assert!(prompt.contains(ITEM_SEPARATOR.trim()));
    }

    #[test]
    fn prompt_spells_out_the_output_contract() {
        let prompt = build_extraction_prompt(&["text".to_string()]);
        assert!(prompt.contains("\"tickers\""));
        assert!(prompt.contains("\"label\""));
    }
}
