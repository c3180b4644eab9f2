use boutique_core::gender::Gender;

#[test]
fn maps_trait_codes_in_either_case() {
    assert_eq!(Gender::from_code('M'), Some(Gender::Male));
    assert_eq!(Gender::from_code('f'), Some(Gender::Female));
    assert_eq!(Gender::from_code('U'), None);
}

#[test]
fn maps_skypatcher_keywords() {
    assert_eq!(Gender::from_keyword("Female"), Some(Gender::Female));
    assert_eq!(Gender::Male.keyword(), "male");
    assert_eq!(Gender::Male.opposite(), Gender::Female);
}
