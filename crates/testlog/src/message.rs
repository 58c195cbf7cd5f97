//! crates/testlog/src/message.rs
//! Positional `{}` placeholder substitution for message templates.

const PLACEHOLDER: &str = "{}";
const ESCAPE: u8 = b'\\';

/// Substitutes `args` into the `{}` placeholders of `template`, in order.
///
/// - `\{}` renders a literal `{}` and does not consume an argument.
/// - `\\{}` renders a single backslash followed by the next argument.
/// - Placeholders left over once the arguments run out stay as literal `{}`.
/// - Arguments beyond the last placeholder are ignored.
///
/// # Examples
///
/// ```
/// use testlog::format_message;
///
/// assert_eq!(format_message("Hello {}", &["world"]), "Hello world");
/// assert_eq!(format_message("{} and {}", &["one"]), "one and {}");
/// assert_eq!(format_message(r"set \{} to {}", &["x"]), "set {} to x");
/// ```
#[must_use]
pub fn format_message<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let bytes = template.as_bytes();
    let mut rendered = String::with_capacity(template.len());
    let mut args = args.iter().map(AsRef::as_ref).peekable();
    let mut start = 0;

    while args.peek().is_some() {
        let Some(offset) = template[start..].find(PLACEHOLDER) else {
            break;
        };
        let index = start + offset;

        if escaped_at(bytes, index) {
            if escaped_at(bytes, index - 1) {
                rendered.push_str(&template[start..index - 1]);
                rendered.push_str(args.next().unwrap_or_default());
                start = index + PLACEHOLDER.len();
            } else {
                rendered.push_str(&template[start..index - 1]);
                rendered.push('{');
                start = index + 1;
            }
        } else {
            rendered.push_str(&template[start..index]);
            rendered.push_str(args.next().unwrap_or_default());
            start = index + PLACEHOLDER.len();
        }
    }

    rendered.push_str(&template[start..]);
    rendered
}

fn escaped_at(bytes: &[u8], index: usize) -> bool {
    index >= 1 && bytes[index - 1] == ESCAPE
}
