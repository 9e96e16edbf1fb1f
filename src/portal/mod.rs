//! Portal endpoint layout
//!
//! All URLs are built from the configured base URL so tests can point the
//! crawler at a mock portal.

use url::Url;

const LOGIN_PATH: &str = "/login/portal_user_authenticate.json";
const ROSTER_PATH: &str = "/provider/members_roster";
const MEMBER_LIST_PATH: &str = "/provider/members_roster_list.json";
const MEMBER_INFO_PATH: &str = "/provider/get_member_info.json";
const VERIFY_ELIGIBILITY_PATH: &str = "/provider/verify_eligibility.json";
const VERIFY_PAGE_PATH: &str = "/provider/verify_eligibility";
const ELIGIBILITY_PATH: &str = "/provider/eligible";

/// URL builder for every portal page the crawler visits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Creates the endpoint set for a portal root
    ///
    /// The base is stored in the normalized form the HTTP client reports
    /// back (lowercase host, no default port). A trailing slash is dropped so
    /// paths can be appended directly.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            base: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Portal homepage, carrying the login token
    pub fn homepage(&self) -> String {
        self.base.clone()
    }

    pub fn login(&self) -> String {
        self.path(LOGIN_PATH)
    }

    pub fn roster(&self) -> String {
        self.path(ROSTER_PATH)
    }

    /// Whether a final response URL is the roster page itself
    pub fn is_roster(&self, url: &str) -> bool {
        match (Url::parse(url), Url::parse(&self.roster())) {
            (Ok(landed), Ok(roster)) => landed == roster,
            _ => false,
        }
    }

    /// Roster page for one first letter of one facility
    pub fn member_list(&self, alpha: char, facility_id: &str) -> Result<String, url::ParseError> {
        self.with_query(
            MEMBER_LIST_PATH,
            &[
                ("alpha", alpha.to_string().as_str()),
                ("providerFacilityId", facility_id),
            ],
        )
    }

    pub fn member_info(&self, member_id: &str, facility_id: &str) -> Result<String, url::ParseError> {
        self.with_query(
            MEMBER_INFO_PATH,
            &[("id", member_id), ("providerFacilityId", facility_id)],
        )
    }

    /// Member id lookup by birth date and subscriber id
    ///
    /// Name and zip are sent blank, matching the portal's own search form.
    pub fn verify_eligibility(
        &self,
        dob: &str,
        subscriber_id: &str,
        facility_id: &str,
    ) -> Result<String, url::ParseError> {
        self.with_query(
            VERIFY_ELIGIBILITY_PATH,
            &[
                ("verifyDob", dob),
                ("verifySubscriberId", subscriber_id),
                ("verifyLastName", ""),
                ("verifyFirstName", ""),
                ("verifyZip", ""),
                ("providerFacilityId", facility_id),
            ],
        )
    }

    /// Page the portal expects as the referer of eligibility lookups
    pub fn verify_page(&self) -> String {
        self.path(VERIFY_PAGE_PATH)
    }

    /// Eligibility detail page; `dob` is in `YYYY-MM-DD` path form
    pub fn eligibility(&self, mid: &str, subscriber_id: &str, dob: &str, facility_id: &str) -> String {
        format!(
            "{}{}/{}/{}/{}/{}/0/1",
            self.base, ELIGIBILITY_PATH, mid, subscriber_id, dob, facility_id
        )
    }

    /// Resolves a link found on a portal page
    ///
    /// Root-relative links are appended to the base; absolute links pass
    /// through unchanged.
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            self.path(href)
        } else {
            format!("{}/{}", self.base, href)
        }
    }

    fn path(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn with_query(&self, path: &str, params: &[(&str, &str)]) -> Result<String, url::ParseError> {
        let url = Url::parse_with_params(&self.path(path), params)?;
        Ok(url.to_string())
    }
}
