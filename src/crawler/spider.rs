//! Portal navigation state machine
//!
//! Each handler is a synchronous function of a request and its response that
//! returns the steps to take next. Handlers never perform I/O; the
//! coordinator dispatches the requests they produce and routes the items,
//! notifications and hand-offs to their sinks.
//!
//! ```text
//! Homepage -> Login -> Roster -> MemberList (a..z) -> MemberDetail -> Eligibility -> PrintEligibility
//!                   \-> (partial) VerifyEligibility -> Eligibility
//! ```

use crate::config::Config;
use crate::crawler::request::{CrawlContext, PortalRequest, PortalResponse, Step};
use crate::crawler::retry::{RetryDecision, RetryGovernor};
use crate::parser::{
    extract_auth_token, parse_eligibility, parse_login, parse_member_info, parse_member_list,
    parse_roster, parse_subscriber_name, parse_verify_eligibility, FacilityIdSet, ParseError,
    VerifyOutcome,
};
use crate::portal::Endpoints;
use crate::services::{hostname, DocumentUpload, Notification, SecondaryCheck};
use crate::session::{portal_dob, Credential, ScrapeMode, TargetMember};
use crate::state::{
    EligibilityConfirmation, Field, Item, MemberRecord, Stage, StatusUpdate, SyncStatus,
    ValidationResult,
};
use std::sync::Arc;
use thiserror::Error;

/// Why a handler could not finish
#[derive(Debug, Error)]
pub enum CrawlFailure {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected page: {0}")]
    Navigation(String),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("response failed: {0}")]
    Transient(String),
}

impl From<url::ParseError> for CrawlFailure {
    fn from(e: url::ParseError) -> Self {
        CrawlFailure::Navigation(format!("could not build portal URL: {}", e))
    }
}

/// The eligibility crawl for one portal
pub struct EligibilitySpider {
    endpoints: Endpoints,
    mode: ScrapeMode,
    credentials: Vec<Arc<Credential>>,
    targets: Vec<TargetMember>,
    governor: RetryGovernor,
    source: String,
    host: String,
    secondary_enabled: bool,
}

impl EligibilitySpider {
    /// Creates a spider for a set of logins
    ///
    /// # Arguments
    ///
    /// * `endpoints` - Portal URL layout
    /// * `mode` - Which part of the portal to walk
    /// * `credentials` - One session is started per credential
    /// * `targets` - Members to look up in partial mode; ignored otherwise
    pub fn new(
        endpoints: Endpoints,
        mode: ScrapeMode,
        credentials: Vec<Credential>,
        targets: Vec<TargetMember>,
    ) -> Self {
        let secondary_enabled = mode != ScrapeMode::Validate
            && credentials
                .first()
                .is_some_and(Credential::has_secondary_login);

        let targets = if mode == ScrapeMode::Partial {
            targets
        } else {
            Vec::new()
        };

        Self {
            endpoints,
            mode,
            credentials: credentials.into_iter().map(Arc::new).collect(),
            targets,
            governor: RetryGovernor::default(),
            source: "portal".to_string(),
            host: hostname(),
            secondary_enabled,
        }
    }

    /// Creates a spider for the portal described by `config`
    ///
    /// Retry schedule, portal name and notification host are taken from the
    /// config; the host falls back to the machine name.
    pub fn from_config(
        config: &Config,
        mode: ScrapeMode,
        credentials: Vec<Credential>,
        targets: Vec<TargetMember>,
    ) -> Result<Self, url::ParseError> {
        let endpoints = Endpoints::new(&config.portal.base_url)?;
        let mut spider = Self::new(endpoints, mode, credentials, targets)
            .with_retry(RetryGovernor::from_config(&config.retry))
            .with_source(config.portal.name.clone());

        if let Some(host) = config.notify.as_ref().and_then(|n| n.host.clone()) {
            spider = spider.with_host(host);
        }
        Ok(spider)
    }

    pub fn with_retry(mut self, governor: RetryGovernor) -> Self {
        self.governor = governor;
        self
    }

    /// Sets the portal name used as notification prefix and secondary-check source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn mode(&self) -> ScrapeMode {
        self.mode
    }

    pub fn credentials(&self) -> &[Arc<Credential>] {
        &self.credentials
    }

    pub fn targets(&self) -> &[TargetMember] {
        &self.targets
    }

    pub fn secondary_enabled(&self) -> bool {
        self.secondary_enabled
    }

    /// One homepage visit per credential, each in its own session
    pub fn start_requests(&self) -> Vec<PortalRequest> {
        self.credentials
            .iter()
            .map(|credential| {
                let context = CrawlContext::new(
                    MemberRecord::from_credential(credential),
                    credential.session_key(),
                )
                .with_credential(Arc::clone(credential));

                tracing::debug!("Visiting homepage for user \"{}\"", credential.username);
                PortalRequest::get(self.endpoints.homepage(), Stage::Homepage, context)
            })
            .collect()
    }

    /// Handles a response and returns the next steps
    ///
    /// Failures are resolved here per stage; nothing a single response does
    /// can abort other branches of the crawl.
    pub fn handle(&self, request: &PortalRequest, response: PortalResponse) -> Vec<Step> {
        let result = match request.stage {
            Stage::Homepage => self.parse_homepage(request, &response),
            Stage::Login => self.parse_login(request, &response),
            Stage::Roster => self.parse_roster(request, &response),
            Stage::MemberList => self.parse_member_list(request, &response),
            Stage::MemberDetail => self.parse_member_detail(request, &response),
            Stage::VerifyEligibility => self.parse_verify(request, &response),
            Stage::Eligibility => self.parse_eligibility(request, &response),
            Stage::PrintEligibility => Ok(self.parse_print(request, &response)),
        };

        match result {
            Ok(steps) => steps,
            Err(failure) => self.recover(request, &response, failure),
        }
    }

    /// Handles a request that never produced a usable response
    ///
    /// The branch ends with a notification, plus an invalid result in
    /// validate mode.
    pub fn on_transport_error(&self, request: &PortalRequest, error: &str) -> Vec<Step> {
        let failure = CrawlFailure::Transient(error.to_string());
        tracing::error!(
            "Request to {} ({}) failed: {}",
            request.url,
            request.stage,
            error
        );
        let mut steps = vec![Step::Notify(self.notice(
            "response failed",
            &request.context.record,
            &failure,
        ))];
        steps.extend(self.invalid_if_validating(request));
        steps
    }

    // ===== Stage handlers =====

    fn parse_homepage(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let context = &request.context;
        let mut steps = vec![self.status(&context.record, SyncStatus::Pending)];

        let credential = context.credential.as_ref().ok_or_else(|| {
            CrawlFailure::Navigation("homepage request carries no credential".to_string())
        })?;

        let Some(token) = extract_auth_token(&response.body) else {
            tracing::error!(
                "Authentication token not found on homepage for user \"{}\"",
                credential.username
            );
            if self.mode == ScrapeMode::Validate {
                tracing::info!("Validation failed for user \"{}\"", credential.username);
                steps.push(self.invalid(&context.record));
            }
            return Ok(steps);
        };

        let form = vec![
            ("username".to_string(), credential.username.clone()),
            ("password".to_string(), credential.password.clone()),
            ("authenticity_token".to_string(), token),
        ];
        let login_context = context.follow_shared().with_credential(Arc::clone(credential));

        steps.push(Step::Request(PortalRequest::post_form(
            self.endpoints.login(),
            form,
            Stage::Login,
            login_context,
        )));
        Ok(steps)
    }

    fn parse_login(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let record = self.session_record(request);
        let login = parse_login(&response.body)?;

        if !login.is_ok() {
            return Err(CrawlFailure::Auth(login.response_message));
        }

        tracing::info!("Login successful for user \"{}\"", record.get(Field::Username));

        match self.mode {
            ScrapeMode::All | ScrapeMode::Validate => {
                let context = request.context.follow(record);
                Ok(vec![Step::Request(PortalRequest::get(
                    self.endpoints.roster(),
                    Stage::Roster,
                    context,
                ))])
            }
            ScrapeMode::Partial => self.request_targets(request, &record),
        }
    }

    /// Requests eligibility for every target belonging to this session
    fn request_targets(
        &self,
        request: &PortalRequest,
        session_record: &MemberRecord,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let username = session_record.get(Field::Username);
        let mut steps = Vec::new();

        for target in self.targets.iter().filter(|t| t.username == username) {
            let record = session_record.with_target(target);
            let mid = record.get(Field::Mid);

            if mid.is_empty() {
                tracing::info!(
                    "Requesting verify eligibility for member with subscriber id {} and facility ID {} for user \"{}\"",
                    record.get(Field::SubscriberId),
                    record.get(Field::Fid),
                    username
                );
                let url = self.endpoints.verify_eligibility(
                    record.get(Field::Dob),
                    record.get(Field::SubscriberId),
                    record.get(Field::Fid),
                )?;
                steps.push(Step::Request(
                    PortalRequest::get(url, Stage::VerifyEligibility, request.context.follow(record))
                        .xhr()
                        .header("Referer", self.endpoints.verify_page()),
                ));
            } else {
                tracing::info!(
                    "Requesting eligibility info for member with mid {} and facility ID {} for user \"{}\"",
                    mid,
                    record.get(Field::Fid),
                    username
                );
                match self.eligibility_request(request, record) {
                    Ok(eligibility) => steps.push(Step::Request(
                        eligibility.header("Referer", self.endpoints.verify_page()),
                    )),
                    Err(step) => steps.push(step),
                }
            }
        }

        if steps.is_empty() {
            tracing::warn!("No target members listed for user \"{}\"", username);
        }
        Ok(steps)
    }

    fn parse_roster(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let record = &request.context.record;
        let username = record.get(Field::Username);

        if !self.endpoints.is_roster(&response.url) {
            return Err(CrawlFailure::Navigation(format!(
                "expected roster page, landed on {}",
                response.url
            )));
        }

        let roster = parse_roster(&response.body)?;

        if self.mode == ScrapeMode::Validate {
            tracing::info!("Validation successful for user \"{}\"", username);
            let fid_map = match roster.labels() {
                FacilityIdSet::Labels(labels) => labels,
                FacilityIdSet::Ids(_) => Default::default(),
            };
            return Ok(vec![Step::Emit(Item::Validation(ValidationResult::valid(
                record.as_ref().clone(),
                fid_map,
            )))]);
        }

        let facilities = roster.ids();
        if facilities.is_empty() {
            tracing::error!("Facility ID not found for user \"{}\"", username);
            return Ok(Vec::new());
        }

        let facility_id = record.get(Field::FacilityId);
        if !facilities.contains(facility_id) {
            tracing::error!(
                "Facility ID {} not matching for user \"{}\"",
                facility_id,
                username
            );
            return Ok(Vec::new());
        }

        let context = request
            .context
            .follow(record.derive().set(Field::Fid, facility_id).build());

        let mut steps = Vec::with_capacity(26);
        for alpha in 'a'..='z' {
            let url = self.endpoints.member_list(alpha, facility_id)?;
            tracing::debug!(
                "Fetching members for alphabet {} with facility ID {} for user \"{}\"",
                alpha,
                facility_id,
                username
            );
            steps.push(Step::Request(
                PortalRequest::get(url, Stage::MemberList, context.clone()).xhr(),
            ));
        }
        Ok(steps)
    }

    fn parse_member_list(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let record = &request.context.record;
        let members = parse_member_list(&response.body)?;

        if members.is_empty() {
            tracing::info!(
                "No members data received from {} for user \"{}\"",
                request.url,
                record.get(Field::Username)
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            "{} members received from {} for user \"{}\"",
            members.len(),
            request.url,
            record.get(Field::Username)
        );

        let fid = record.get(Field::Fid);
        let mut steps = Vec::with_capacity(members.len());
        for member in members {
            let url = self.endpoints.member_info(&member.id, fid)?;
            let member_record = record
                .derive()
                .set(Field::Fname, &member.fname)
                .set(Field::Lname, &member.lname)
                .set(Field::City, &member.city)
                .set(Field::Mid, &member.id)
                .set(Field::Dentist, member.dentist())
                .build();

            steps.push(Step::Request(
                PortalRequest::get(url, Stage::MemberDetail, request.context.follow(member_record))
                    .xhr(),
            ));
        }
        Ok(steps)
    }

    fn parse_member_detail(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let info = parse_member_info(&response.body)?;
        let mut draft = request
            .context
            .record
            .derive()
            .set(Field::Address, info.address())
            .set(Field::Dob, &info.dob)
            .set(Field::Telephone, &info.telephone)
            .set(Field::SubscriberId, &info.subscriber_id);

        tracing::info!(
            "Parsing additional info for member {} {} with facility ID {} for user \"{}\"",
            request.context.record.get(Field::Lname),
            request.context.record.get(Field::Fname),
            request.context.record.get(Field::Fid),
            request.context.record.get(Field::Username)
        );

        let mut steps = Vec::new();
        if self.mode == ScrapeMode::All {
            draft = draft.status(SyncStatus::UpdatedNoPdf).mco_status(true);
        }
        let record = draft.build();

        if self.mode == ScrapeMode::All {
            if let Some(check) = self.secondary_check(&record) {
                steps.push(check);
            }
            steps.push(Step::Emit(Item::Member(record.clone())));
        }

        if self.mode == ScrapeMode::Partial || record.is_new_patient() {
            match self.eligibility_request(request, record) {
                Ok(eligibility) => steps.push(Step::Request(eligibility)),
                Err(step) => steps.push(step),
            }
        }
        Ok(steps)
    }

    fn parse_verify(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let record = &request.context.record;

        match parse_verify_eligibility(&response.body)? {
            VerifyOutcome::Verified { mid } => {
                let record = record.derive().set(Field::Mid, &mid).build();
                tracing::info!(
                    "Requesting eligibility info for member with mid {} and facility ID {} for user \"{}\"",
                    mid,
                    record.get(Field::Fid),
                    record.get(Field::Username)
                );
                Ok(vec![match self.eligibility_request(request, record) {
                    Ok(eligibility) => Step::Request(eligibility),
                    Err(step) => step,
                }])
            }
            VerifyOutcome::Rejected { message } => {
                tracing::error!(
                    "Verify eligibility rejected for member with subscriber id {} and facility ID {} for user \"{}\": {}",
                    record.get(Field::SubscriberId),
                    record.get(Field::Fid),
                    record.get(Field::Username),
                    message
                );
                tracing::debug!("Received response: {}", response.body);
                let failure = CrawlFailure::Navigation(message);
                Ok(vec![Step::Notify(self.notice(
                    "parse verify eligibility failed",
                    record,
                    &failure,
                ))])
            }
        }
    }

    fn parse_eligibility(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
    ) -> Result<Vec<Step>, CrawlFailure> {
        let record = &request.context.record;
        tracing::info!(
            "Parsing eligibility info for member with mid {} and facility ID {} for user \"{}\"",
            record.get(Field::Mid),
            record.get(Field::Fid),
            record.get(Field::Username)
        );

        let detail = parse_eligibility(&response.body)?;

        let draft = record
            .derive()
            .status(SyncStatus::Updated)
            .set(Field::Plan, detail.plan.as_deref().unwrap_or_default())
            .set(
                Field::BecameEligibleOn,
                detail.became_eligible_on.as_deref().unwrap_or_default(),
            )
            .set(
                Field::ConfirmationNo,
                detail.confirmation_no.as_deref().unwrap_or_default(),
            )
            .set(
                Field::LastServiceDate,
                detail.last_service_date.as_deref().unwrap_or_default(),
            )
            .set(
                Field::LastProphylaxisDate,
                detail.last_prophylaxis_date.as_deref().unwrap_or_default(),
            );

        let mco_status = match detail.mco_status() {
            Ok(status) => status,
            Err(e) if e.is_structural() => {
                tracing::warn!(
                    "Eligibility page for member {} lacks expected text ({}), emitting partial record",
                    record.get(Field::Mid),
                    e
                );
                return Ok(vec![Step::Emit(Item::Member(draft.build()))]);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            "active is {:?} and eligible is {:?} for member {}",
            detail.active,
            detail.eligible,
            record.get(Field::Mid)
        );

        let record = draft.mco_status(mco_status).build();
        let mut steps = Vec::with_capacity(2);

        if let Some(href) = &detail.print_link {
            tracing::info!(
                "Requesting print eligibility info for member with mid {} and facility ID {} for user \"{}\"",
                record.get(Field::Mid),
                record.get(Field::Fid),
                record.get(Field::Username)
            );
            steps.push(Step::Request(PortalRequest::get(
                self.endpoints.resolve(href),
                Stage::PrintEligibility,
                request.context.follow(record.clone()),
            )));
        }

        steps.push(Step::Emit(Item::Member(record)));
        Ok(steps)
    }

    fn parse_print(&self, request: &PortalRequest, response: &PortalResponse) -> Vec<Step> {
        let mut draft = request.context.record.derive().new_patient(false);

        if self.mode == ScrapeMode::Partial {
            match parse_subscriber_name(&response.body) {
                Ok(name) => {
                    draft = draft
                        .set(Field::Fname, &name.fname)
                        .set(Field::Lname, &name.lname);
                }
                Err(e) => tracing::warn!(
                    "Subscriber name not found on print page for member {}: {}",
                    request.context.record.get(Field::Mid),
                    e
                ),
            }
        }
        let record = draft.build();

        tracing::info!(
            "Rendering print eligibility info for member with mid {} and facility ID {} for user \"{}\"",
            record.get(Field::Mid),
            record.get(Field::Fid),
            record.get(Field::Username)
        );

        let mut steps = vec![Step::Emit(Item::EligibilityRequested(
            EligibilityConfirmation::for_record(&record),
        ))];

        if self.mode == ScrapeMode::Partial {
            steps.push(Step::StoreDocument(DocumentUpload::eligibility(
                response.body.clone(),
                record.get(Field::SubscriberId),
                record.get(Field::Jobid),
                record.get(Field::Fname),
                record.get(Field::Lname),
            )));
        }

        if record.get(Field::Plan).contains("MEDICAID") {
            if let Some(check) = self.secondary_check(&record) {
                steps.push(check);
            }
        }
        steps
    }

    // ===== Failure handling =====

    /// Applies the stage's failure policy
    fn recover(
        &self,
        request: &PortalRequest,
        response: &PortalResponse,
        failure: CrawlFailure,
    ) -> Vec<Step> {
        let record = &request.context.record;

        match request.stage {
            Stage::Homepage => {
                tracing::error!("Error reading homepage: {}", failure);
                vec![Step::Notify(self.notice(
                    "parse home page failed",
                    record,
                    &failure,
                ))]
            }
            Stage::Login => {
                let record = self.session_record(request);
                let mut steps = vec![self.status(&record, SyncStatus::Outdated)];
                match failure {
                    CrawlFailure::Auth(_) => {
                        tracing::error!(
                            "Authentication failed for user \"{}\": {}",
                            record.get(Field::Username),
                            failure
                        );
                        steps.push(Step::Notify(self.notice(
                            "authentication failed",
                            &record,
                            &failure,
                        )));
                        if self.mode == ScrapeMode::Validate {
                            steps.push(self.invalid(&record));
                        }
                    }
                    _ => {
                        tracing::error!(
                            "Error reading login response for user \"{}\": {}",
                            record.get(Field::Username),
                            failure
                        );
                        steps.extend(self.retry_or_abandon(request, "parse login failed", &failure));
                    }
                }
                steps
            }
            Stage::Roster => {
                tracing::error!(
                    "Unexpected roster page for user \"{}\": {}",
                    record.get(Field::Username),
                    failure
                );
                tracing::debug!("Received response: {}", response.body);
                let mut steps = vec![
                    self.status(record, SyncStatus::Outdated),
                    Step::Notify(self.notice("parse facility id failed", record, &failure)),
                ];
                if self.mode == ScrapeMode::Validate {
                    tracing::info!("Validation failed for user \"{}\"", record.get(Field::Username));
                    steps.push(self.invalid(record));
                }
                steps
            }
            Stage::MemberList => {
                tracing::error!("Error reading members from {}: {}", request.url, failure);
                self.retry_or_abandon(request, "parse members failed", &failure)
            }
            Stage::MemberDetail => {
                tracing::error!(
                    "Error reading additional info for member {} {}: {}",
                    record.get(Field::Lname),
                    record.get(Field::Fname),
                    failure
                );
                self.retry_or_abandon(request, "parse member failed", &failure)
            }
            Stage::VerifyEligibility => {
                tracing::error!(
                    "Error reading verify eligibility for subscriber id {}: {}",
                    record.get(Field::SubscriberId),
                    failure
                );
                tracing::debug!("Received response: {}", response.body);
                vec![
                    self.status(record, SyncStatus::Outdated),
                    Step::Notify(self.notice(
                        "parse verify eligibility failed",
                        record,
                        &failure,
                    )),
                ]
            }
            Stage::Eligibility => {
                tracing::error!(
                    "Error reading eligibility for member with mid {}: {}",
                    record.get(Field::Mid),
                    failure
                );
                self.retry_or_abandon(request, "parse member eligibility failed", &failure)
            }
            Stage::PrintEligibility => {
                tracing::error!("Error reading print page: {}", failure);
                Vec::new()
            }
        }
    }

    /// Reissues the request after a delay, or gives up and notifies
    ///
    /// Giving up in validate mode also reports the credential as invalid.
    fn retry_or_abandon(
        &self,
        request: &PortalRequest,
        subject: &str,
        failure: &CrawlFailure,
    ) -> Vec<Step> {
        match self.governor.escalate(request.context.retry) {
            RetryDecision::Reissue { budget, delay } => {
                tracing::warn!(
                    "Retrying {} in {:?} (attempt {} of {})",
                    request.url,
                    delay,
                    budget.attempts(),
                    self.governor.max_reissues()
                );
                vec![Step::Retry {
                    request: request.reissue(budget),
                    delay,
                }]
            }
            RetryDecision::Abandon { .. } => {
                tracing::error!("Giving up on {} after repeated failures", request.url);
                let mut steps = vec![Step::Notify(self.notice(
                    subject,
                    &request.context.record,
                    failure,
                ))];
                steps.extend(self.invalid_if_validating(request));
                steps
            }
        }
    }

    // ===== Helpers =====

    /// Eligibility page request for a record, or a notification if its birth date is unusable
    fn eligibility_request(
        &self,
        request: &PortalRequest,
        record: MemberRecord,
    ) -> Result<PortalRequest, Step> {
        let Some(dob) = portal_dob(record.get(Field::Dob)) else {
            tracing::error!(
                "Invalid date of birth '{}' for member with mid {}",
                record.get(Field::Dob),
                record.get(Field::Mid)
            );
            let failure = CrawlFailure::Parse(ParseError::MissingField("dob"));
            return Err(Step::Notify(self.notice(
                "eligibility request failed",
                &record,
                &failure,
            )));
        };

        let url = self.endpoints.eligibility(
            record.get(Field::Mid),
            record.get(Field::SubscriberId),
            &dob,
            record.get(Field::Fid),
        );
        Ok(PortalRequest::get(
            url,
            Stage::Eligibility,
            request.context.follow(record),
        ))
    }

    /// The request's record with the session username filled in
    fn session_record(&self, request: &PortalRequest) -> MemberRecord {
        let username = request
            .context
            .credential
            .as_ref()
            .map(|c| c.username.as_str())
            .unwrap_or(request.context.session.as_str());

        request
            .context
            .record
            .derive()
            .set(Field::Username, username)
            .build()
    }

    fn status(&self, record: &MemberRecord, status: SyncStatus) -> Step {
        Step::Emit(Item::Status(StatusUpdate {
            record: record.derive().status(status).build(),
            members: self.targets.clone(),
        }))
    }

    fn invalid(&self, record: &MemberRecord) -> Step {
        Step::Emit(Item::Validation(ValidationResult::invalid(record.clone())))
    }

    /// Terminal failures in validate mode still produce a result for the session
    fn invalid_if_validating(&self, request: &PortalRequest) -> Option<Step> {
        (self.mode == ScrapeMode::Validate).then(|| self.invalid(&self.session_record(request)))
    }

    fn secondary_check(&self, record: &MemberRecord) -> Option<Step> {
        if !self.secondary_enabled {
            return None;
        }
        Some(Step::Secondary(SecondaryCheck {
            subscriber_id: record.get(Field::SubscriberId).to_string(),
            dob: record.get(Field::Dob).to_string(),
            first_name: record.get(Field::Fname).to_string(),
            last_name: record.get(Field::Lname).to_string(),
            company: record.get(Field::Company).to_string(),
            practice: record.get(Field::Practice).to_string(),
            source: self.source.clone(),
        }))
    }

    fn notice(&self, subject: &str, record: &MemberRecord, failure: &CrawlFailure) -> Notification {
        Notification::new(
            format!("{} {}", self.source, subject),
            format!(
                "On host {}\nUser \"{}\", company {}, practice {}, facility ID {}\nError: {}",
                self.host,
                record.get(Field::Username),
                record.get(Field::Company),
                record.get(Field::Practice),
                record.get(Field::FacilityId),
                failure
            ),
        )
    }
}
