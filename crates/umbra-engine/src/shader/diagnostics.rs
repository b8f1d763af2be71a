use crate::error::SourceLocation;

/// Splits a compiler info log into one [`SourceLocation`] per non-blank line.
///
/// Lines shaped like `ERROR: <source>:<line>: <message>` (or `WARNING:`) yield
/// their line number and message; anything else is kept verbatim with line `-1`.
pub fn parse_info_log(log: &str) -> Vec<SourceLocation> {
    log.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            parse_line(line)
                .unwrap_or_else(|| SourceLocation::new(SourceLocation::UNKNOWN_LINE, line))
        })
        .collect()
}

fn parse_line(line: &str) -> Option<SourceLocation> {
    let rest = line
        .strip_prefix("ERROR:")
        .or_else(|| line.strip_prefix("WARNING:"))?
        .trim_start();

    let (source, rest) = rest.split_once(':')?;
    let (line_no, message) = rest.split_once(':')?;
    if !is_digits(source) || !is_digits(line_no) {
        return None;
    }

    Some(SourceLocation::new(line_no.parse().ok()?, message.trim_start()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_line_is_structured() {
        let locations = parse_info_log("ERROR: 0:12: 'x' : syntax error");
        assert_eq!(locations, vec![SourceLocation::new(12, "'x' : syntax error")]);
    }

    #[test]
    fn unrecognized_line_is_kept_verbatim() {
        let locations = parse_info_log("some garbage");
        assert_eq!(locations, vec![SourceLocation::new(-1, "some garbage")]);
    }

    #[test]
    fn warnings_blank_lines_and_padding() {
        let log = "\n  WARNING: 1:3: implicit cast  \n\nERROR:0:7:missing ';'\n";
        assert_eq!(
            parse_info_log(log),
            vec![
                SourceLocation::new(3, "implicit cast"),
                SourceLocation::new(7, "missing ';'"),
            ]
        );
    }

    #[test]
    fn malformed_numbers_fall_back_to_raw_line() {
        let locations = parse_info_log("ERROR: 0: 12: spaced\nERROR: a:1: named\nERROR: 0:99999999999: big");
        assert!(locations.iter().all(|l| l.line == -1));
        assert_eq!(locations[0].message, "ERROR: 0: 12: spaced");
    }

    #[test]
    fn empty_log_yields_nothing() {
        assert!(parse_info_log("  \n\t\n").is_empty());
    }
}
