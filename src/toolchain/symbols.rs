use crate::build::types::SymbolMap;
use regex::Regex;
use std::sync::OnceLock;

type SymbolGrammar = fn(&str) -> Option<(String, u64)>;

/// Address-line grammars in priority order.
const GRAMMARS: [SymbolGrammar; 3] = [label_directive, vice_label, generic_triple];

/// Reads a label/address table. Blank and `;` comment lines are skipped,
/// addresses are hexadecimal, and a repeated label keeps its last value.
pub fn parse_symbols(content: &str) -> SymbolMap {
    let mut symbols = SymbolMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some((name, address)) = GRAMMARS.iter().find_map(|grammar| grammar(line)) {
            symbols.insert(name, address);
        }
    }
    symbols
}

// .label start=$080e
fn label_directive(line: &str) -> Option<(String, u64)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\.label\s+([^\s=]+)\s*=\s*\$?([0-9A-Fa-f]+)\b").expect("valid regex")
    });
    capture_pair(re, line, 1, 2)
}

// al C:080e .start
fn vice_label(line: &str) -> Option<(String, u64)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^al\s+[A-Za-z]:\$?([0-9A-Fa-f]+)\s+\.(\S+)").expect("valid regex")
    });
    capture_pair(re, line, 2, 1)
}

// al 080e start
fn generic_triple(line: &str) -> Option<(String, u64)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\w+\s+\$?([0-9A-Fa-f]+)\s+(\w+)").expect("valid regex")
    });
    capture_pair(re, line, 2, 1)
}

fn capture_pair(re: &Regex, line: &str, name_group: usize, address_group: usize) -> Option<(String, u64)> {
    let caps = re.captures(line)?;
    let name = caps.get(name_group)?.as_str().to_string();
    let address = u64::from_str_radix(caps.get(address_group)?.as_str(), 16).ok()?;
    Some((name, address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_directive_with_dollar_prefix() {
        let symbols = parse_symbols(".label start=$80e\n; comment\n");
        assert_eq!(symbols, SymbolMap::from([("start".to_string(), 2062)]));
    }

    #[test]
    fn label_directive_without_dollar_prefix() {
        let symbols = parse_symbols(".label irq = c000");
        assert_eq!(symbols.get("irq"), Some(&0xc000));
    }

    #[test]
    fn vice_lines_drop_the_leading_dot() {
        let symbols = parse_symbols("al C:080e .start\nal C:$0810 .loop\n");
        assert_eq!(symbols.get("start"), Some(&0x080e));
        assert_eq!(symbols.get("loop"), Some(&0x0810));
        assert!(!symbols.contains_key(".start"));
    }

    #[test]
    fn generic_lines_accept_optional_dollar() {
        let symbols = parse_symbols("al 0000 zero\nsym $d020 border\n");
        assert_eq!(symbols.get("zero"), Some(&0));
        assert_eq!(symbols.get("border"), Some(&0xd020));
    }

    #[test]
    fn later_definitions_overwrite_earlier_ones() {
        let symbols = parse_symbols(".label start=$0801\nal C:0900 .start\n");
        assert_eq!(symbols.get("start"), Some(&0x0900));
    }

    #[test]
    fn noise_lines_contribute_nothing() {
        let symbols = parse_symbols("\n   \n; al C:1000 .commented\n.namespace music {\n}\n");
        assert!(symbols.is_empty());
    }
}
