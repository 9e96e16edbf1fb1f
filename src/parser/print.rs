use super::{selector, ParseError};
use scraper::{ElementRef, Html};

const SUBSCRIBER_LABEL: &str = "Subscriber's Name:";

/// Name printed on the eligibility confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberName {
    pub fname: String,
    pub lname: String,
}

/// Reads the subscriber name from a printed eligibility confirmation
///
/// The label sits in a `div.infoLabel` whose parent also holds the value,
/// e.g. `Subscriber's Name: ANA MARIA DIAZ`. The value is split once on the
/// first space: first name, then everything else as the last name.
pub fn parse_subscriber_name(html: &str) -> Result<SubscriberName, ParseError> {
    let document = Html::parse_document(html);
    let label_sel = selector("div.infoLabel")?;

    let label = document
        .select(&label_sel)
        .find(|el| el.text().collect::<String>().trim() == SUBSCRIBER_LABEL)
        .ok_or(ParseError::MissingElement("div.infoLabel Subscriber's Name"))?;

    let parent = label
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ParseError::MissingElement("subscriber name container"))?;

    let text = parent.text().collect::<String>();
    let value = text.rsplit(':').next().unwrap_or_default().trim();

    match value.split_once(' ') {
        Some((fname, lname)) => Ok(SubscriberName {
            fname: fname.to_string(),
            lname: lname.to_string(),
        }),
        None => Err(ParseError::MissingField("subscriber last name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscriber_name() {
        let html = r#"<div class="info">
            <div class="infoLabel">Subscriber's Name:</div> ANA MARIA DIAZ
        </div>"#;

        let name = parse_subscriber_name(html).unwrap();
        assert_eq!(name.fname, "ANA");
        assert_eq!(name.lname, "MARIA DIAZ");
    }

    #[test]
    fn test_other_labels_ignored() {
        let html = r#"
            <div><div class="infoLabel">Subscriber ID:</div> 700123</div>
            <div><div class="infoLabel">Subscriber's Name:</div>JOHN DOE</div>"#;

        let name = parse_subscriber_name(html).unwrap();
        assert_eq!(name.fname, "JOHN");
        assert_eq!(name.lname, "DOE");
    }

    #[test]
    fn test_missing_label_or_single_word() {
        assert!(parse_subscriber_name("<div>nothing here</div>")
            .unwrap_err()
            .is_structural());

        let single = r#"<div><div class="infoLabel">Subscriber's Name:</div> CHER</div>"#;
        assert!(matches!(
            parse_subscriber_name(single),
            Err(ParseError::MissingField(_))
        ));
    }
}
