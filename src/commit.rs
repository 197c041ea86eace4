use crate::constants::CUT_MARK;

/// build the commit message template shown in the scratch document
///
/// the message goes on the empty first line, everything below the cut mark
/// is only there for reference
pub fn template(status_text: &str, diff: &str) -> String {
    let header = r#"
# Please enter the commit message for your changes. Lines starting
# with '#' will be ignored, and an empty message aborts the commit.
#"#;

    let mut output = String::from(header);
    output.push('\n');
    for line in status_text.lines() {
        if line.is_empty() {
            output.push('#');
        } else {
            output.push_str("# ");
            output.push_str(line);
        }
        output.push('\n');
    }

    output.push_str(CUT_MARK);
    output.push('\n');
    output.push_str("# Do not modify or remove the line above.\n");
    output.push_str("# Everything below it will be ignored.\n");
    output.push_str(diff);
    output
}

/// extract the commit message from a saved template
///
/// drops everything from the cut mark onwards and all comment lines
pub fn extract_message(saved: &str) -> String {
    saved
        .lines()
        .take_while(|line| *line != CUT_MARK)
        .filter(|line| !line.starts_with('#'))
        .fold(String::new(), |mut message, line| {
            message.push_str(line);
            message.push('\n');
            message
        })
}
