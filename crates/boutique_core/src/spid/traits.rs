use crate::entry::TraitFilters;
use crate::gender::Gender;

/// Parses a slash-delimited trait field such as `F/-U`. Returns the offending
/// code when one is not recognized.
pub fn parse_traits(field: &str) -> Result<TraitFilters, String> {
    let mut traits = TraitFilters::default();
    for raw in field.split('/') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let (negated, code) = match token.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, token),
        };
        let mut chars = code.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return Err(token.to_string());
        };

        if let Some(gender) = Gender::from_code(letter) {
            traits.gender = Some(if negated { gender.opposite() } else { gender });
            continue;
        }
        match traits.flag_mut(letter) {
            Some(flag) => *flag = Some(!negated),
            None => return Err(token.to_string()),
        }
    }
    Ok(traits)
}

/// Renders trait filters in fixed code order: gender, then `U S C L T D`.
pub fn render_traits(traits: &TraitFilters) -> String {
    let mut codes = Vec::new();
    if let Some(gender) = traits.gender {
        codes.push(gender.code().to_string());
    }
    for (code, value) in traits.flags() {
        match value {
            Some(true) => codes.push(code.to_string()),
            Some(false) => codes.push(format!("-{code}")),
            None => {}
        }
    }
    codes.join("/")
}
