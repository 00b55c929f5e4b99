//! Identifier types shared by the reference-tracking stores: cells, ranges,
//! labels and the tagged reference a label points at.

pub mod cell;
pub mod error;
pub mod label;
pub mod range;
pub mod reference;

pub use cell::*;
pub use error::*;
pub use label::*;
pub use range::*;
pub use reference::*;

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn identifiers_serialise_as_text() {
        let cell = CellReference::parse("B3").unwrap();
        assert_eq!(serde_json::to_string(&cell).unwrap(), "\"B3\"");
        let range: CellRangeReference = serde_json::from_str("\"A1:C4\"").unwrap();
        assert_eq!(range.end(), CellReference::parse("C4").unwrap());
        assert!(serde_json::from_str::<LabelName>("\"A1\"").is_err());
    }

    #[test]
    fn mapping_roundtrips() {
        let mapping = LabelMapping::new(
            LabelName::new("Total").unwrap(),
            CellRangeReference::parse("A1:A9").unwrap(),
        )
        .unwrap();
        let json = serde_json::to_string(&mapping).unwrap();
        let back: LabelMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
