/**
 * Notification Templates
 *
 * Pure builders that turn a domain event into a `NotificationDraft` with a
 * fixed type, title and message. `NotificationService` wraps each of these
 * with a `create_*` method that persists and pushes the draft.
 *
 * Interpolated names and titles are user-controlled, so generated titles and
 * messages are clipped to the notification length bounds.
 */

use serde_json::json;
use uuid::Uuid;

use crate::shared::notification::{truncate_chars, MAX_MESSAGE_CHARS, MAX_TITLE_CHARS};
use crate::shared::{NotificationDraft, NotificationType, Priority};

/// Outcome of a job application review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDecision {
    Approved,
    Rejected,
}

impl JobDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobDecision::Approved => "approved",
            JobDecision::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDirection {
    Received,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunityAction {
    Like,
    Comment,
    Mention,
}

fn draft(
    recipient: Uuid,
    kind: NotificationType,
    title: impl AsRef<str>,
    message: impl AsRef<str>,
) -> NotificationDraft {
    NotificationDraft::new(
        recipient,
        kind,
        truncate_chars(title.as_ref(), MAX_TITLE_CHARS),
        truncate_chars(message.as_ref(), MAX_MESSAGE_CHARS),
    )
}

pub fn system(
    recipient: Uuid,
    title: &str,
    message: &str,
    data: Option<serde_json::Value>,
    priority: Option<Priority>,
) -> NotificationDraft {
    let mut draft = draft(recipient, NotificationType::System, title, message)
        .with_priority(priority.unwrap_or_default());
    if let Some(data) = data {
        draft = draft.with_data(data);
    }
    draft
}

pub fn connection_request(recipient: Uuid, sender: Uuid, sender_name: &str) -> NotificationDraft {
    draft(
        recipient,
        NotificationType::ConnectionRequest,
        "New Connection Request",
        format!("{} wants to connect with you", sender_name),
    )
    .with_sender(sender)
    .with_data(json!({ "senderId": sender, "senderName": sender_name }))
}

pub fn connection_accepted(recipient: Uuid, sender: Uuid, sender_name: &str) -> NotificationDraft {
    draft(
        recipient,
        NotificationType::ConnectionAccepted,
        "Connection Accepted",
        format!("{} accepted your connection request", sender_name),
    )
    .with_sender(sender)
    .with_data(json!({ "senderId": sender, "senderName": sender_name }))
}

pub fn job_application(
    employer: Uuid,
    applicant: Uuid,
    applicant_name: &str,
    job_title: &str,
    job_id: &str,
    application_id: &str,
) -> NotificationDraft {
    draft(
        employer,
        NotificationType::JobApplication,
        "New Job Application",
        format!("{} applied for \"{}\"", applicant_name, job_title),
    )
    .with_sender(applicant)
    .with_data(json!({
        "jobId": job_id,
        "applicationId": application_id,
        "applicantId": applicant,
        "applicantName": applicant_name,
        "jobTitle": job_title,
    }))
}

pub fn job_status(
    applicant: Uuid,
    employer: Uuid,
    employer_name: &str,
    job_title: &str,
    decision: JobDecision,
    job_id: &str,
    application_id: &str,
) -> NotificationDraft {
    let (kind, title, message) = match decision {
        JobDecision::Approved => (
            NotificationType::JobApproved,
            "Job Application Approved",
            format!("Congratulations! Your application for \"{}\" has been approved", job_title),
        ),
        JobDecision::Rejected => (
            NotificationType::JobRejected,
            "Job Application Rejected",
            format!("Your application for \"{}\" was not selected", job_title),
        ),
    };

    draft(applicant, kind, title, message)
        .with_sender(employer)
        .with_data(json!({
            "jobId": job_id,
            "applicationId": application_id,
            "employerId": employer,
            "employerName": employer_name,
            "jobTitle": job_title,
            "status": decision.as_str(),
        }))
}

pub fn message(
    recipient: Uuid,
    sender: Uuid,
    sender_name: &str,
    preview: &str,
    conversation_id: Uuid,
) -> NotificationDraft {
    draft(
        recipient,
        NotificationType::Message,
        format!("New message from {}", sender_name),
        preview,
    )
    .with_sender(sender)
    .with_priority(Priority::Medium)
    .with_data(json!({
        "conversationId": conversation_id,
        "senderId": sender,
        "senderName": sender_name,
    }))
}

pub fn verification(
    recipient: Uuid,
    verification_type: &str,
    outcome: VerificationOutcome,
    reason: Option<&str>,
) -> NotificationDraft {
    let (kind, title, message) = match outcome {
        VerificationOutcome::Approved => (
            NotificationType::VerificationApproved,
            "Verification Approved",
            format!("Your {} verification has been approved", verification_type),
        ),
        VerificationOutcome::Rejected => {
            let mut message = format!("Your {} verification was rejected", verification_type);
            if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
                message.push_str(": ");
                message.push_str(reason);
            }
            (NotificationType::VerificationRejected, "Verification Rejected", message)
        }
    };

    draft(recipient, kind, title, message)
        .with_priority(Priority::High)
        .with_data(json!({ "verificationType": verification_type, "reason": reason }))
}

/// `amount` is in rupees
#[allow(clippy::too_many_arguments)]
pub fn payment(
    recipient: Uuid,
    counterparty: Option<Uuid>,
    counterparty_name: &str,
    amount: f64,
    direction: PaymentDirection,
    transaction_id: &str,
    description: Option<&str>,
) -> NotificationDraft {
    let (kind, title, mut message) = match direction {
        PaymentDirection::Received => (
            NotificationType::PaymentReceived,
            "Payment Received",
            format!("You received ₹{} from {}", amount, counterparty_name),
        ),
        PaymentDirection::Sent => (
            NotificationType::PaymentSent,
            "Payment Sent",
            format!("You sent ₹{} to {}", amount, counterparty_name),
        ),
    };
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        message.push_str(" - ");
        message.push_str(description);
    }

    let mut draft = draft(recipient, kind, title, message)
        .with_priority(Priority::High)
        .with_data(json!({
            "amount": amount,
            "transactionId": transaction_id,
            "description": description,
            "senderName": counterparty_name,
        }));
    if let Some(counterparty) = counterparty {
        draft = draft.with_sender(counterparty);
    }
    draft
}

pub fn community(
    recipient: Uuid,
    sender: Uuid,
    sender_name: &str,
    action: CommunityAction,
    post_id: &str,
    post_title: &str,
    comment_content: Option<&str>,
) -> NotificationDraft {
    let (kind, title, message) = match action {
        CommunityAction::Like => (
            NotificationType::CommunityLike,
            "Post Liked",
            format!("{} liked your post \"{}\"", sender_name, post_title),
        ),
        CommunityAction::Comment => (
            NotificationType::CommunityComment,
            "New Comment",
            format!("{} commented on your post \"{}\"", sender_name, post_title),
        ),
        CommunityAction::Mention => (
            NotificationType::CommunityMention,
            "You were mentioned",
            format!("{} mentioned you in a comment", sender_name),
        ),
    };

    draft(recipient, kind, title, message)
        .with_sender(sender)
        .with_priority(Priority::Low)
        .with_data(json!({
            "postId": post_id,
            "postTitle": post_title,
            "commentContent": comment_content,
            "senderName": sender_name,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_application_template() {
        let employer = Uuid::new_v4();
        let applicant = Uuid::new_v4();
        let d = job_application(employer, applicant, "Alice", "Barista", "job-1", "app-1");

        assert_eq!(d.recipient, employer);
        assert_eq!(d.sender, Some(applicant));
        assert_eq!(d.kind, NotificationType::JobApplication);
        assert_eq!(d.title, "New Job Application");
        assert_eq!(d.message, "Alice applied for \"Barista\"");
        let data = d.data.unwrap();
        assert_eq!(data["jobId"], "job-1");
        assert_eq!(data["applicationId"], "app-1");
        assert_eq!(data["applicantName"], "Alice");
        assert_eq!(d.priority, None);
    }

    #[test]
    fn test_job_status_templates() {
        let approved = job_status(Uuid::new_v4(), Uuid::new_v4(), "Cafe", "Barista", JobDecision::Approved, "j", "a");
        assert_eq!(approved.kind, NotificationType::JobApproved);
        assert_eq!(
            approved.message,
            "Congratulations! Your application for \"Barista\" has been approved"
        );
        assert_eq!(approved.data.unwrap()["status"], "approved");

        let rejected = job_status(Uuid::new_v4(), Uuid::new_v4(), "Cafe", "Barista", JobDecision::Rejected, "j", "a");
        assert_eq!(rejected.kind, NotificationType::JobRejected);
        assert_eq!(rejected.title, "Job Application Rejected");
        assert_eq!(rejected.message, "Your application for \"Barista\" was not selected");
    }

    #[test]
    fn test_connection_templates() {
        let d = connection_request(Uuid::new_v4(), Uuid::new_v4(), "Bob");
        assert_eq!(d.title, "New Connection Request");
        assert_eq!(d.message, "Bob wants to connect with you");

        let d = connection_accepted(Uuid::new_v4(), Uuid::new_v4(), "Bob");
        assert_eq!(d.kind, NotificationType::ConnectionAccepted);
        assert_eq!(d.message, "Bob accepted your connection request");
    }

    #[test]
    fn test_verification_rejection_appends_reason() {
        let d = verification(Uuid::new_v4(), "identity", VerificationOutcome::Rejected, Some("blurry photo"));
        assert_eq!(d.message, "Your identity verification was rejected: blurry photo");
        assert_eq!(d.priority, Some(Priority::High));

        let d = verification(Uuid::new_v4(), "identity", VerificationOutcome::Rejected, None);
        assert_eq!(d.message, "Your identity verification was rejected");

        let d = verification(Uuid::new_v4(), "email", VerificationOutcome::Approved, None);
        assert_eq!(d.kind, NotificationType::VerificationApproved);
        assert_eq!(d.message, "Your email verification has been approved");
    }

    #[test]
    fn test_payment_templates() {
        let d = payment(Uuid::new_v4(), None, "Cafe", 250.0, PaymentDirection::Received, "tx1", Some("shift pay"));
        assert_eq!(d.kind, NotificationType::PaymentReceived);
        assert_eq!(d.message, "You received ₹250 from Cafe - shift pay");

        let d = payment(Uuid::new_v4(), None, "Bob", 99.5, PaymentDirection::Sent, "tx2", None);
        assert_eq!(d.title, "Payment Sent");
        assert_eq!(d.message, "You sent ₹99.5 to Bob");
    }

    #[test]
    fn test_community_templates() {
        let like = community(Uuid::new_v4(), Uuid::new_v4(), "Eve", CommunityAction::Like, "p1", "Tips", None);
        assert_eq!(like.message, "Eve liked your post \"Tips\"");
        assert_eq!(like.priority, Some(Priority::Low));

        let mention = community(Uuid::new_v4(), Uuid::new_v4(), "Eve", CommunityAction::Mention, "p1", "Tips", Some("@you"));
        assert_eq!(mention.title, "You were mentioned");
        assert_eq!(mention.message, "Eve mentioned you in a comment");
        assert_eq!(mention.data.unwrap()["commentContent"], "@you");
    }

    #[test]
    fn test_message_template() {
        let conversation = Uuid::new_v4();
        let d = message(Uuid::new_v4(), Uuid::new_v4(), "Alice", "see you at 5", conversation);
        assert_eq!(d.title, "New message from Alice");
        assert_eq!(d.message, "see you at 5");
        assert_eq!(d.data.unwrap()["conversationId"], conversation.to_string());
    }

    #[test]
    fn test_long_inputs_still_validate() {
        let name = "N".repeat(300);
        let d = message(Uuid::new_v4(), Uuid::new_v4(), &name, &"p".repeat(900), Uuid::new_v4());
        assert!(d.validate().is_ok());
        assert_eq!(d.title.chars().count(), MAX_TITLE_CHARS);
    }
}
