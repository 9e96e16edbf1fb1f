use super::{selector, ParseError};
use scraper::Html;
use std::collections::BTreeMap;

/// Where the facility identifiers on the roster page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilitySource {
    /// A single hidden `input#facilityId` carried the value
    Input,
    /// The `div#headerText` facility selection box was scanned
    Selection,
}

/// One facility offered on the roster page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub id: String,
    /// Option label; empty for the hidden-input form
    pub label: String,
}

/// Facilities assigned to the logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterFacilities {
    pub source: FacilitySource,
    pub facilities: Vec<Facility>,
}

impl RosterFacilities {
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Identifier list used when crawling rosters
    pub fn ids(&self) -> FacilityIdSet {
        FacilityIdSet::Ids(self.facilities.iter().map(|f| f.id.clone()).collect())
    }

    /// Identifier to label map reported in validation mode
    pub fn labels(&self) -> FacilityIdSet {
        FacilityIdSet::Labels(
            self.facilities
                .iter()
                .map(|f| (f.id.clone(), f.label.clone()))
                .collect(),
        )
    }
}

/// Facility identifiers in the shape each scrape mode consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityIdSet {
    Ids(Vec<String>),
    Labels(BTreeMap<String, String>),
}

impl FacilityIdSet {
    pub fn contains(&self, id: &str) -> bool {
        match self {
            FacilityIdSet::Ids(ids) => ids.iter().any(|i| i == id),
            FacilityIdSet::Labels(labels) => labels.contains_key(id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FacilityIdSet::Ids(ids) => ids.len(),
            FacilityIdSet::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Discovers the facilities on the members roster page
///
/// A non-empty `input#facilityId` wins outright. Otherwise every option inside
/// `div#headerText` is collected, skipping the `"0"` placeholder ("Select a
/// Facility"). The options are read through the wrapping div rather than the
/// `select` element.
///
/// # Arguments
///
/// * `html` - The roster page body
///
/// # Returns
///
/// * `Ok(RosterFacilities)` - Possibly empty facility list
/// * `Err(ParseError::MissingElement)` - Neither a usable input nor the selection container exists
pub fn parse_roster(html: &str) -> Result<RosterFacilities, ParseError> {
    let document = Html::parse_document(html);

    let input_sel = selector("input#facilityId")?;
    let input_value = document
        .select(&input_sel)
        .next()
        .and_then(|el| el.value().attr("value"))
        .filter(|v| !v.is_empty());

    if let Some(id) = input_value {
        return Ok(RosterFacilities {
            source: FacilitySource::Input,
            facilities: vec![Facility {
                id: id.to_string(),
                label: String::new(),
            }],
        });
    }

    let container_sel = selector("div#headerText")?;
    let container = document
        .select(&container_sel)
        .next()
        .ok_or(ParseError::MissingElement("div#headerText"))?;

    let option_sel = selector("option")?;
    let facilities = container
        .select(&option_sel)
        .filter_map(|option| {
            let id = option.value().attr("value")?;
            if id == "0" {
                return None;
            }
            Some(Facility {
                id: id.to_string(),
                label: option.text().collect::<String>(),
            })
        })
        .collect();

    Ok(RosterFacilities {
        source: FacilitySource::Selection,
        facilities,
    })
}
