//! Applicant attributes and their encoding into the model's feature vector.
//!
//! The model was fitted on nine columns in a fixed order: the three numeric
//! attributes, two binary flags and one one-hot block for the region.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

pub const FEATURE_COUNT: usize = 9;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "bmi",
    "children",
    "smoker",
    "region_northeast",
    "region_northwest",
    "region_southeast",
    "region_southwest",
];

/// How categorical values outside the known literals are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryPolicy {
    /// Unknown values encode as all-zero flags.
    #[default]
    Lenient,
    /// Unknown values reject the submission.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoker {
    Yes,
    No,
}

impl Smoker {
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Smoker::Yes),
            "no" => Some(Smoker::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Northeast,
        Region::Northwest,
        Region::Southeast,
        Region::Southwest,
    ];

    pub fn from_form_value(value: &str) -> Option<Self> {
        match value {
            "northeast" => Some(Region::Northeast),
            "northwest" => Some(Region::Northwest),
            "southeast" => Some(Region::Southeast),
            "southwest" => Some(Region::Southwest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Northeast => "northeast",
            Region::Northwest => "northwest",
            Region::Southeast => "southeast",
            Region::Southwest => "southwest",
        }
    }

    /// One-hot flags in northeast, northwest, southeast, southwest order.
    pub fn one_hot(region: Option<Region>) -> [f32; 4] {
        let mut flags = [0.0; 4];
        if let Some(region) = region {
            flags[region as usize] = 1.0;
        }
        flags
    }
}

/// The nine model inputs, built fresh for every prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub age: f32,
    pub sex: f32,
    pub bmi: f32,
    pub children: f32,
    pub smoker: f32,
    pub region_northeast: f32,
    pub region_northwest: f32,
    pub region_southeast: f32,
    pub region_southwest: f32,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.bmi,
            self.children,
            self.smoker,
            self.region_northeast,
            self.region_northwest,
            self.region_southeast,
            self.region_southwest,
        ]
    }
}

/// A typed applicant, as accepted by the JSON API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Applicant {
    pub age: f32,
    pub sex: String,
    pub bmi: f32,
    pub children: f32,
    pub smoker: String,
    pub region: String,
}

impl Applicant {
    pub fn encode(&self, policy: CategoryPolicy) -> Result<FeatureVector, FeatureError> {
        let age = finite("age", self.age)?;
        let bmi = finite("bmi", self.bmi)?;
        let children = finite("children", self.children)?;

        let sex = Sex::from_form_value(&self.sex);
        let smoker = Smoker::from_form_value(&self.smoker);
        let region = Region::from_form_value(&self.region);

        if sex.is_none() {
            unknown_category(policy, "sex", &self.sex)?;
        }
        if smoker.is_none() {
            unknown_category(policy, "smoker", &self.smoker)?;
        }
        if region.is_none() {
            unknown_category(policy, "region", &self.region)?;
        }

        let [northeast, northwest, southeast, southwest] = Region::one_hot(region);

        Ok(FeatureVector {
            age,
            sex: flag(sex == Some(Sex::Male)),
            bmi,
            children,
            smoker: flag(smoker == Some(Smoker::Yes)),
            region_northeast: northeast,
            region_northwest: northwest,
            region_southeast: southeast,
            region_southwest: southwest,
        })
    }
}

/// The raw HTML form submission. Every field is required; they are optional
/// here only so a missing one can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantForm {
    pub age: Option<String>,
    pub sex: Option<String>,
    pub bmi: Option<String>,
    pub children: Option<String>,
    pub smoker: Option<String>,
    pub region: Option<String>,
}

impl ApplicantForm {
    pub fn into_applicant(self) -> Result<Applicant, FeatureError> {
        Ok(Applicant {
            age: parse_number("age", self.age)?,
            sex: required("sex", self.sex)?,
            bmi: parse_number("bmi", self.bmi)?,
            children: parse_number("children", self.children)?,
            smoker: required("smoker", self.smoker)?,
            region: required("region", self.region)?,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, FeatureError> {
    value.ok_or(FeatureError::MissingField(field))
}

fn parse_number(field: &'static str, value: Option<String>) -> Result<f32, FeatureError> {
    let raw = required(field, value)?;
    match raw.trim().parse::<f32>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(FeatureError::InvalidNumber { field, value: raw }),
    }
}

/// JSON numbers beyond f32 range deserialize as infinity.
fn finite(field: &'static str, value: f32) -> Result<f32, FeatureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }
}

fn unknown_category(
    policy: CategoryPolicy,
    field: &'static str,
    value: &str,
) -> Result<(), FeatureError> {
    match policy {
        CategoryPolicy::Strict => Err(FeatureError::UnknownCategory {
            field,
            value: value.to_string(),
        }),
        CategoryPolicy::Lenient => {
            warn!("Unrecognized {} value {:?}, encoding as 0", field, value);
            Ok(())
        }
    }
}

fn flag(set: bool) -> f32 {
    if set {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant(sex: &str, smoker: &str, region: &str) -> Applicant {
        Applicant {
            age: 30.0,
            sex: sex.to_string(),
            bmi: 25.0,
            children: 2.0,
            smoker: smoker.to_string(),
            region: region.to_string(),
        }
    }

    fn form(fields: &[(&str, &str)]) -> ApplicantForm {
        let mut form = ApplicantForm::default();
        for (name, value) in fields {
            let value = Some(value.to_string());
            match *name {
                "age" => form.age = value,
                "sex" => form.sex = value,
                "bmi" => form.bmi = value,
                "children" => form.children = value,
                "smoker" => form.smoker = value,
                "region" => form.region = value,
                other => panic!("unknown field {other}"),
            }
        }
        form
    }

    #[test]
    fn encodes_reference_applicant() {
        let features = form(&[
            ("age", "30"),
            ("sex", "male"),
            ("bmi", "25.0"),
            ("children", "2"),
            ("smoker", "no"),
            ("region", "southeast"),
        ])
        .into_applicant()
        .and_then(|a| a.encode(CategoryPolicy::Lenient))
        .unwrap();

        assert_eq!(features.as_array(), [30.0, 1.0, 25.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn known_region_sets_exactly_one_flag() {
        for (index, region) in Region::ALL.iter().enumerate() {
            let features = applicant("male", "no", region.as_str())
                .encode(CategoryPolicy::Lenient)
                .unwrap();
            let flags = &features.as_array()[5..];
            assert_eq!(flags.iter().sum::<f32>(), 1.0, "{region:?}");
            assert_eq!(flags[index], 1.0, "{region:?}");
        }
    }

    #[test]
    fn unknown_region_clears_all_flags() {
        for region in ["", "North East", "NORTHEAST", "midwest"] {
            let features = applicant("male", "no", region)
                .encode(CategoryPolicy::Lenient)
                .unwrap();
            assert_eq!(&features.as_array()[5..], &[0.0; 4]);
        }
    }

    #[test]
    fn binary_flags_match_exact_literals() {
        let set = applicant("male", "yes", "northeast")
            .encode(CategoryPolicy::Lenient)
            .unwrap();
        assert_eq!((set.sex, set.smoker), (1.0, 1.0));

        for (sex, smoker) in [("female", "no"), ("Male", "YES"), ("other", "y")] {
            let clear = applicant(sex, smoker, "northeast")
                .encode(CategoryPolicy::Lenient)
                .unwrap();
            assert_eq!((clear.sex, clear.smoker), (0.0, 0.0), "{sex}/{smoker}");
        }
    }

    #[test]
    fn strict_policy_rejects_unknown_values() {
        let err = applicant("male", "no", "midwest")
            .encode(CategoryPolicy::Strict)
            .unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownCategory {
                field: "region",
                value: "midwest".into()
            }
        );

        let err = applicant("x", "no", "northeast")
            .encode(CategoryPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, FeatureError::UnknownCategory { field: "sex", .. }));

        assert!(applicant("female", "no", "southwest")
            .encode(CategoryPolicy::Strict)
            .is_ok());
    }

    #[test]
    fn missing_age_is_an_error() {
        let err = form(&[
            ("sex", "male"),
            ("bmi", "25.0"),
            ("children", "2"),
            ("smoker", "no"),
            ("region", "southeast"),
        ])
        .into_applicant()
        .unwrap_err();
        assert_eq!(err, FeatureError::MissingField("age"));
    }

    #[test]
    fn missing_categorical_field_is_an_error() {
        let err = form(&[("age", "30"), ("bmi", "25"), ("children", "0"), ("sex", "male")])
            .into_applicant()
            .unwrap_err();
        assert_eq!(err, FeatureError::MissingField("smoker"));
    }

    #[test]
    fn malformed_numbers_are_errors() {
        for bad in ["", "abc", "1,5", "NaN", "inf"] {
            let err = form(&[
                ("age", "30"),
                ("sex", "male"),
                ("bmi", bad),
                ("children", "2"),
                ("smoker", "no"),
                ("region", "southeast"),
            ])
            .into_applicant()
            .unwrap_err();
            assert_eq!(
                err,
                FeatureError::InvalidNumber {
                    field: "bmi",
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn non_finite_numbers_are_rejected_when_encoding() {
        let mut overflowed = applicant("male", "no", "southeast");
        overflowed.age = f32::INFINITY;
        assert_eq!(
            overflowed.encode(CategoryPolicy::Lenient).unwrap_err(),
            FeatureError::InvalidNumber {
                field: "age",
                value: "inf".into()
            }
        );

        let mut unset = applicant("male", "no", "southeast");
        unset.children = f32::NAN;
        assert!(matches!(
            unset.encode(CategoryPolicy::Lenient),
            Err(FeatureError::InvalidNumber { field: "children", .. })
        ));
    }

    #[test]
    fn numbers_tolerate_surrounding_whitespace() {
        let applicant = form(&[
            ("age", " 41 "),
            ("sex", "female"),
            ("bmi", "31.5\n"),
            ("children", "0"),
            ("smoker", "yes"),
            ("region", "northwest"),
        ])
        .into_applicant()
        .unwrap();
        assert_eq!(applicant.age, 41.0);
        assert_eq!(applicant.bmi, 31.5);
    }
}
