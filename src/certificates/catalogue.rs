use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateType {
    pub id: i64,
    pub type_name: &'static str,
    pub price: i64,
    pub required_docs: &'static [&'static str],
}

pub const CERTIFICATE_TYPES: &[CertificateType] = &[
    CertificateType {
        id: 1,
        type_name: "Structural Engineering Certificate",
        price: 150_00,
        required_docs: &["Structural Plan", "Soil Analysis Report", "Calculation Sheets"],
    },
    CertificateType {
        id: 2,
        type_name: "Geotechnical Engineering Certificate",
        price: 200_00,
        required_docs: &["Borehole Logs", "Geotechnical Evaluation", "Lab Test Results"],
    },
    CertificateType {
        id: 3,
        type_name: "Transportation Engineering Certificate",
        price: 100_00,
        required_docs: &["Traffic Impact Study", "Highway Design Documents", "Safety Analysis"],
    },
];

pub const ISO_STANDARDS: &[&str] = &["ISO 9001", "ISO 14001", "ISO 45001"];

/// Type chosen by the client: catalogue id or free-form name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSelector {
    Id(i64),
    Name(String),
}

/// Resolve the stored type name and the catalogue price for a selection.
/// Unknown names are kept verbatim without a price.
pub fn resolve_type(selector: Option<&TypeSelector>) -> (Option<String>, Option<i64>) {
    let by_id = |id: i64| CERTIFICATE_TYPES.iter().find(|t| t.id == id);
    match selector {
        None => (None, None),
        Some(TypeSelector::Id(id)) => match by_id(*id) {
            Some(t) => (Some(t.type_name.to_string()), Some(t.price)),
            None => (Some(id.to_string()), None),
        },
        Some(TypeSelector::Name(name)) => {
            let name = name.trim();
            if name.is_empty() {
                return (None, None);
            }
            if let Some(t) = name.parse::<i64>().ok().and_then(by_id) {
                return (Some(t.type_name.to_string()), Some(t.price));
            }
            let price = CERTIFICATE_TYPES
                .iter()
                .find(|t| t.type_name == name)
                .map(|t| t.price);
            (Some(name.to_string()), price)
        }
    }
}

/// Price derived from the type name prefix, for rows stored without a price.
pub fn derived_price(certificate_type: Option<&str>) -> Option<i64> {
    let t = certificate_type?.to_ascii_lowercase();
    if t.starts_with("structural") {
        Some(150_00)
    } else if t.starts_with("geotechnical") {
        Some(200_00)
    } else if t.starts_with("transportation") {
        Some(100_00)
    } else {
        None
    }
}

/// Catalogue price for the selection, else the type-prefix rule.
pub fn resolve_price(catalogue: Option<i64>, type_name: Option<&str>) -> Option<i64> {
    catalogue.or_else(|| derived_price(type_name))
}

/// Minor to major currency units for display.
pub fn to_major_units(cents: Option<i64>) -> f64 {
    cents.unwrap_or(0) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_catalogue_id() {
        let (name, price) = resolve_type(Some(&TypeSelector::Id(2)));
        assert_eq!(name.as_deref(), Some("Geotechnical Engineering Certificate"));
        assert_eq!(price, Some(20000));
    }

    #[test]
    fn resolves_numeric_string_and_exact_name() {
        let (name, price) = resolve_type(Some(&TypeSelector::Name("3".into())));
        assert_eq!(name.as_deref(), Some("Transportation Engineering Certificate"));
        assert_eq!(price, Some(10000));

        let (name, price) =
            resolve_type(Some(&TypeSelector::Name("Structural Engineering Certificate".into())));
        assert_eq!(name.as_deref(), Some("Structural Engineering Certificate"));
        assert_eq!(price, Some(15000));
    }

    #[test]
    fn unknown_name_is_kept_without_price() {
        let (name, price) = resolve_type(Some(&TypeSelector::Name("Bridge Survey".into())));
        assert_eq!(name.as_deref(), Some("Bridge Survey"));
        assert_eq!(price, None);
    }

    #[test]
    fn selector_deserializes_from_number_or_string() {
        let id: TypeSelector = serde_json::from_str("1").unwrap();
        assert!(matches!(id, TypeSelector::Id(1)));
        let name: TypeSelector = serde_json::from_str("\"Structural Engineering Certificate\"").unwrap();
        assert!(matches!(name, TypeSelector::Name(_)));
    }

    #[test]
    fn catalogue_then_type_prefix() {
        assert_eq!(resolve_price(Some(20000), Some("Structural anything")), Some(20000));
        assert_eq!(resolve_price(None, Some("structural steel review")), Some(15000));
        assert_eq!(resolve_price(None, Some("Bridge Survey")), None);
    }

    #[test]
    fn major_units_divide_by_hundred() {
        assert_eq!(to_major_units(Some(15000)), 150.0);
        assert_eq!(to_major_units(Some(1999)), 19.99);
        assert_eq!(to_major_units(None), 0.0);
    }
}
