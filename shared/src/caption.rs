/// Turns a property identifier into a caption a human would write.
///
/// Nested property paths only use their last segment, `UPPER_CASE` ids are
/// split on underscores and everything else is split at camel-case and
/// digit boundaries:
///
/// ```
/// # use trellis_shared::caption_from_property_id;
/// assert_eq!(caption_from_property_id("firstName"), "First Name");
/// assert_eq!(caption_from_property_id("address.streetName"), "Street Name");
/// assert_eq!(caption_from_property_id("POSTAL_CODE"), "Postal Code");
/// assert_eq!(caption_from_property_id("HTMLParser"), "HTML Parser");
/// ```
pub fn caption_from_property_id(property_id: &str) -> String {
    let mut id = property_id;
    if let Some(dot) = id.rfind('.') {
        if dot > 0 && dot < id.len() - 1 {
            id = &id[dot + 1..];
        }
    }

    if id.is_empty() {
        return String::new();
    }

    let upper_case_id = id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    let words: Vec<String> = if upper_case_id {
        id.split('_')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    } else {
        split_camel_case(id)
    };

    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_camel_case(id: &str) -> Vec<String> {
    let chars: Vec<char> = id.chars().filter(|c| *c != '_').collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && !current.is_empty() {
            let prev = chars[i - 1];
            let next = chars.get(i + 1);
            let boundary = (c.is_uppercase() && !prev.is_uppercase())
                || (c.is_uppercase() && prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase()))
                || (c.is_ascii_digit() != prev.is_ascii_digit());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(*c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
