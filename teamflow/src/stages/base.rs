//! Stages of the permanent prospecting and sales team.

use super::keys::{APPOINTMENTS, OUTREACH, PROPOSAL, PROSPECTS, SUPERVISOR};
use super::Stage;
use crate::collaborators::{Lead, LeadSource, MessagingService, RelationshipRecordService, SchedulingService};
use crate::config::{SchedulingConfig, SLOT_FORMAT};
use crate::context::{Context, ContextValue};
use crate::errors::PipelineError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Leads come back out of the context as mailboxes; anything unparseable is
/// used verbatim as both name and address.
fn lead_from_entry(entry: &str) -> Lead {
    Lead::from_mailbox(entry).unwrap_or_else(|| Lead::new(entry, entry))
}

/// Reviews the incoming context before any work starts.
#[derive(Debug, Default, Clone, Copy)]
pub struct SalesManager;

impl SalesManager {
    /// Role name.
    pub const ROLE: &'static str = "sales_manager";
}

#[async_trait]
impl Stage for SalesManager {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[SUPERVISOR]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        debug!(existing_keys = ctx.len(), "reviewing context");
        ctx.set(SUPERVISOR, "reviewed");
        Ok(())
    }
}

/// Finds leads and records them as contacts.
pub struct Prospector {
    leads: Arc<dyn LeadSource>,
    records: Arc<dyn RelationshipRecordService>,
    batch_size: usize,
}

impl Prospector {
    /// Role name.
    pub const ROLE: &'static str = "prospector";

    /// Creates a prospector fetching up to `batch_size` leads per run.
    #[must_use]
    pub fn new(
        leads: Arc<dyn LeadSource>,
        records: Arc<dyn RelationshipRecordService>,
        batch_size: usize,
    ) -> Self {
        Self {
            leads,
            records,
            batch_size,
        }
    }
}

impl std::fmt::Debug for Prospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prospector")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for Prospector {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[PROSPECTS]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let leads = self.leads.fetch_leads(self.batch_size).await?;

        for lead in &leads {
            self.records
                .upsert_contact(&lead.contact, &lead.name, Some("prospected"))
                .await?;
        }

        info!(count = leads.len(), "leads prospected");
        ctx.set(PROSPECTS, ContextValue::list(leads.iter().map(Lead::mailbox)));
        Ok(())
    }
}

/// Contacts every prospect through the messaging collaborator.
pub struct OutreachSpecialist {
    messaging: Arc<dyn MessagingService>,
    subject: String,
}

impl OutreachSpecialist {
    /// Role name.
    pub const ROLE: &'static str = "outreach_specialist";

    /// Creates an outreach stage sending messages with `subject`.
    #[must_use]
    pub fn new(messaging: Arc<dyn MessagingService>, subject: impl Into<String>) -> Self {
        Self {
            messaging,
            subject: subject.into(),
        }
    }

    fn body_for(lead: &Lead) -> String {
        format!(
            "Hi {},\n\nWe help practices like yours attract more patients with compliant, \
             done-for-you marketing. Would you be open to a short call this week?\n",
            lead.name
        )
    }
}

impl std::fmt::Debug for OutreachSpecialist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutreachSpecialist")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for OutreachSpecialist {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[OUTREACH]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let prospects: Vec<Lead> = ctx
            .require_list(Self::ROLE, PROSPECTS)?
            .iter()
            .map(|entry| lead_from_entry(entry))
            .collect();

        let mut recipients = Vec::with_capacity(prospects.len());
        for lead in &prospects {
            self.messaging
                .send(&lead.contact, &self.subject, &Self::body_for(lead))
                .await?;
            recipients.push(lead.mailbox());
        }

        let status = if recipients.is_empty() { "no_prospects" } else { "sent" };
        info!(sent = recipients.len(), status, "outreach finished");

        ctx.set(
            OUTREACH,
            ContextValue::map([
                ("status", ContextValue::from(status)),
                ("recipients", ContextValue::List(recipients)),
            ]),
        );
        Ok(())
    }
}

/// Books a meeting with every contacted lead, one slot after another.
///
/// Appointments are keyed by the lead's mailbox, so two practices sharing a
/// name keep separate entries.
pub struct AppointmentSetter {
    scheduling: Arc<dyn SchedulingService>,
    slots: SchedulingConfig,
}

impl AppointmentSetter {
    /// Role name.
    pub const ROLE: &'static str = "appointment_setter";

    /// Creates an appointment setter using the configured slot layout.
    #[must_use]
    pub fn new(scheduling: Arc<dyn SchedulingService>, slots: SchedulingConfig) -> Self {
        Self { scheduling, slots }
    }
}

impl std::fmt::Debug for AppointmentSetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppointmentSetter")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for AppointmentSetter {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[APPOINTMENTS]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let outreach = ctx.require_map(Self::ROLE, OUTREACH)?;
        let recipients: Vec<Lead> = match outreach.get("recipients") {
            None => Vec::new(),
            Some(value) => value
                .as_list()
                .ok_or_else(|| {
                    PipelineError::unexpected_type(
                        Self::ROLE,
                        "outreach.recipients",
                        "a list",
                        value.kind_name(),
                    )
                })?
                .iter()
                .map(|entry| lead_from_entry(entry))
                .collect(),
        };

        let mut slot = self.slots.first_slot_time()?;
        let step = chrono::Duration::minutes(i64::from(self.slots.duration_minutes));

        let mut appointments = BTreeMap::new();
        for lead in &recipients {
            let time = slot.format(SLOT_FORMAT).to_string();
            let reference = self
                .scheduling
                .schedule_meeting(&lead.contact, &time, self.slots.duration_minutes)
                .await?;
            debug!(lead = %lead.name, time = %time, "meeting booked");
            appointments.insert(lead.mailbox(), ContextValue::Text(reference));
            slot += step;
        }

        info!(booked = appointments.len(), "appointments scheduled");
        ctx.set(APPOINTMENTS, appointments);
        Ok(())
    }
}

/// Prepares proposals for the leads that booked a meeting.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProposalBuilder;

impl ProposalBuilder {
    /// Role name.
    pub const ROLE: &'static str = "proposal_builder";
}

#[async_trait]
impl Stage for ProposalBuilder {
    fn role(&self) -> &str {
        Self::ROLE
    }

    fn output_keys(&self) -> &[&'static str] {
        &[PROPOSAL]
    }

    async fn run(&self, ctx: &mut Context) -> Result<(), PipelineError> {
        let leads: Vec<String> = ctx
            .require_map(Self::ROLE, APPOINTMENTS)?
            .keys()
            .cloned()
            .collect();

        let status = if leads.is_empty() { "no_meetings" } else { "prepared" };
        ctx.set(
            PROPOSAL,
            ContextValue::map([
                ("status", ContextValue::from(status)),
                ("prospects", ContextValue::List(leads)),
            ]),
        );
        Ok(())
    }
}
