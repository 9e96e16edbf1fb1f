use std::fmt;

/// Page of the portal a request targets
///
/// The stage tag travels with each request and selects the handler that
/// reads its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Portal root, carrying the login token
    Homepage,
    /// JSON login call
    Login,
    /// Members roster page listing the user's facilities
    Roster,
    /// Roster entries for one letter of one facility
    MemberList,
    /// Demographics of one member
    MemberDetail,
    /// Member id lookup for partial-mode targets without one
    VerifyEligibility,
    /// Eligibility detail page
    Eligibility,
    /// Printable eligibility confirmation
    PrintEligibility,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::Login => "login",
            Self::Roster => "roster",
            Self::MemberList => "member_list",
            Self::MemberDetail => "member_detail",
            Self::VerifyEligibility => "verify_eligibility",
            Self::Eligibility => "eligibility",
            Self::PrintEligibility => "print_eligibility",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
