// file: src/citation/patterns.rs
// description: compiled regex pattern for bracketed citation references
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // [Doc 1], [Source 2, p.5], [Ref 3, §4.3], [Source 4, page 2, section 1.1], [Source 5, §page2_Article_5]
    pub static ref CITATION: Regex = Regex::new(
        r"(?i)\[(?:Doc|Source|Ref)\s*(\d+)(?:,\s*(?:p\.?|page)\s*(\d+))?(?:,\s*(?:§|section)\s*([\w.§]+))?\]"
    ).expect("CITATION regex is valid");
}
