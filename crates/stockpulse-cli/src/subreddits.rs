//! Subreddit roster and selection parsing.

/// Stock discussion subreddits monitored by default, preferred-first.
pub(crate) const STOCK_SUBREDDITS: &[&str] = &[
    "wallstreetbets",
    "stocks",
    "investing",
    "StockMarket",
    "options",
    "pennystocks",
    "Daytrading",
    "swingtrading",
    "RobinHood",
    "SecurityAnalysis",
];

/// Parse a 1-based selection string against `all`.
///
/// Supports single indexes (`"3"`), inclusive ranges (`"1-5"`) and mixes
/// (`"1,3-5,8"`). Invalid or out-of-bounds parts are warned about and
/// skipped; duplicates are removed while preserving first-seen order.
pub(crate) fn parse_subreddit_selection(selection: &str, all: &[&str]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();

    for part in selection.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let bounds = (start.trim().parse::<usize>(), end.trim().parse::<usize>());
            let (Ok(start), Ok(end)) = bounds else {
                tracing::warn!(part, "invalid subreddit range; skipping");
                continue;
            };
            if start == 0 || end > all.len() || start > end {
                tracing::warn!(part, max = all.len(), "subreddit range out of bounds; skipping");
                continue;
            }
            for name in &all[start - 1..end] {
                push_unique(&mut selected, name);
            }
        } else {
            let Ok(index) = part.parse::<usize>() else {
                tracing::warn!(part, "invalid subreddit selection; skipping");
                continue;
            };
            if index == 0 || index > all.len() {
                tracing::warn!(part, max = all.len(), "subreddit index out of bounds; skipping");
                continue;
            }
            push_unique(&mut selected, all[index - 1]);
        }
    }

    selected
}

fn push_unique(selected: &mut Vec<String>, name: &str) {
    if !selected.iter().any(|s| s == name) {
        selected.push(name.to_owned());
    }
}

pub(crate) fn print_subreddit_list() {
    println!("available subreddits:");
    for (i, subreddit) in STOCK_SUBREDDITS.iter().enumerate() {
        println!("  {:>2}. r/{subreddit}", i + 1);
    }
    println!();
    println!("selection examples:");
    println!("  --subreddits 1        just r/{}", STOCK_SUBREDDITS[0]);
    println!("  --subreddits 1-5      the first five");
    println!("  --subreddits 1,3,5    specific picks");
    println!("  --subreddits 2-4,8    a range plus one");
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[&str] = &["a", "b", "c", "d", "e"];

    #[test]
    fn single_index_selects_one() {
        assert_eq!(parse_subreddit_selection("3", ALL), vec!["c"]);
    }

    #[test]
    fn range_is_one_based_and_inclusive() {
        assert_eq!(parse_subreddit_selection("1-3", ALL), vec!["a", "b", "c"]);
    }

    #[test]
    fn mixed_selection_preserves_order_and_dedups() {
        assert_eq!(
            parse_subreddit_selection("2,1-3,5", ALL),
            vec!["b", "a", "c", "e"]
        );
    }

    #[test]
    fn out_of_bounds_parts_are_skipped() {
        assert_eq!(parse_subreddit_selection("9", ALL), Vec::<String>::new());
        assert_eq!(parse_subreddit_selection("4-9", ALL), Vec::<String>::new());
        assert_eq!(parse_subreddit_selection("0", ALL), Vec::<String>::new());
    }

    #[test]
    fn garbage_parts_are_skipped_but_valid_parts_survive() {
        assert_eq!(parse_subreddit_selection("x,2,-,3-2", ALL), vec!["b"]);
    }

    #[test]
    fn roster_has_ten_entries() {
        assert_eq!(STOCK_SUBREDDITS.len(), 10);
        assert_eq!(STOCK_SUBREDDITS[0], "wallstreetbets");
    }
}
