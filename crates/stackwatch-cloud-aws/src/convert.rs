//! Conversions from CloudFormation SDK shapes to the StackWatch model

use aws_sdk_cloudformation::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudformation::types;
use chrono::{DateTime, Utc};
use stackwatch_cloud::{Capability, StackEvent, StackResource, StackStatus};

/// CloudFormation reports a missing stack as a validation error with this text
const MISSING_STACK_MARKER: &str = "does not exist";

pub(crate) fn is_missing_stack_message(message: &str) -> bool {
    message.contains(MISSING_STACK_MARKER)
}

pub(crate) fn timestamp(value: &AwsDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos()).unwrap_or_default()
}

pub(crate) fn capability(value: Capability) -> types::Capability {
    match value {
        Capability::Iam => types::Capability::CapabilityIam,
        Capability::NamedIam => types::Capability::CapabilityNamedIam,
        Capability::AutoExpand => types::Capability::CapabilityAutoExpand,
    }
}

/// Status literal used when the backend leaves a status out
const MISSING_STATUS: &str = "N/A";

pub(crate) fn stack_status(stack: &types::Stack) -> StackStatus {
    let status = stack
        .stack_status()
        .map(|s| s.as_str())
        .unwrap_or(MISSING_STATUS);
    StackStatus::from(status.to_string())
}

/// Events without an id are dropped: the id is the event's identity.
pub(crate) fn stack_event(event: &types::StackEvent) -> Option<StackEvent> {
    let event_id = event.event_id().filter(|id| !id.is_empty())?;
    let converted = StackEvent::new(
        event_id,
        event.timestamp().map(timestamp).unwrap_or_default(),
        event.logical_resource_id().unwrap_or_default(),
        event.resource_status().map(|s| s.as_str().to_string()),
    )
    .with_reason(event.resource_status_reason().map(str::to_string));
    Some(converted)
}

pub(crate) fn stack_resource(resource: &types::StackResource) -> StackResource {
    let converted = StackResource::new(
        resource.logical_resource_id().unwrap_or_default(),
        resource.resource_type().unwrap_or_default(),
        resource
            .resource_status()
            .map(|s| s.as_str())
            .unwrap_or(MISSING_STATUS),
    );
    match resource.physical_resource_id() {
        Some(id) if !id.is_empty() => converted.with_physical_id(id),
        _ => converted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_stack_message_detection() {
        assert!(is_missing_stack_message(
            "Stack with id stack-acme does not exist"
        ));
        assert!(!is_missing_stack_message("Rate exceeded"));
    }

    #[test]
    fn test_timestamp_keeps_seconds_and_nanos() {
        let converted = timestamp(&AwsDateTime::from_secs_and_nanos(1_700_000_000, 250));
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.timestamp_subsec_nanos(), 250);
    }

    #[test]
    fn test_capability_mapping() {
        assert_eq!(
            capability(Capability::NamedIam),
            types::Capability::CapabilityNamedIam
        );
        assert_eq!(capability(Capability::Iam).as_str(), "CAPABILITY_IAM");
    }

    #[test]
    fn test_stack_status_conversion() {
        let stack = types::Stack::builder()
            .stack_name("stack-acme")
            .stack_status(types::StackStatus::UpdateRollbackComplete)
            .build();
        assert_eq!(stack_status(&stack), StackStatus::UpdateRollbackComplete);

        let stack = types::Stack::builder().stack_name("stack-acme").build();
        assert_eq!(stack_status(&stack), StackStatus::Other("N/A".to_string()));
        assert!(!stack_status(&stack).is_terminal());
    }

    #[test]
    fn test_stack_event_conversion() {
        let event = types::StackEvent::builder()
            .event_id("MyBucket-CREATE_FAILED-1")
            .timestamp(AwsDateTime::from_secs(1_704_067_200))
            .logical_resource_id("MyBucket")
            .resource_status(types::ResourceStatus::CreateFailed)
            .resource_status_reason("bucket-acme already exists")
            .build();

        let converted = stack_event(&event).unwrap();
        assert_eq!(converted.event_id, "MyBucket-CREATE_FAILED-1");
        assert_eq!(
            converted.progress_line(),
            "2024-01-01 00:00:00 | MyBucket | CREATE_FAILED | bucket-acme already exists"
        );
    }

    #[test]
    fn test_stack_event_with_missing_fields() {
        let event = types::StackEvent::builder()
            .event_id("e-1")
            .resource_status_reason("")
            .build();

        let converted = stack_event(&event).unwrap();
        assert_eq!(converted.timestamp, DateTime::<Utc>::default());
        assert_eq!(converted.logical_resource_id, "");
        assert_eq!(converted.status, "N/A");
        assert_eq!(converted.reason, None);
    }

    #[test]
    fn test_stack_event_without_id_is_dropped() {
        let event = types::StackEvent::builder()
            .logical_resource_id("MyBucket")
            .resource_status(types::ResourceStatus::CreateComplete)
            .build();
        assert!(stack_event(&event).is_none());

        let event = types::StackEvent::builder().event_id("").build();
        assert!(stack_event(&event).is_none());
    }

    #[test]
    fn test_stack_resource_conversion() {
        let resource = types::StackResource::builder()
            .logical_resource_id("MyQueue")
            .physical_resource_id("https://sqs/sqs-acme")
            .resource_type("AWS::SQS::Queue")
            .resource_status(types::ResourceStatus::CreateComplete)
            .build();

        assert_eq!(
            stack_resource(&resource),
            StackResource::new("MyQueue", "AWS::SQS::Queue", "CREATE_COMPLETE")
                .with_physical_id("https://sqs/sqs-acme")
        );
    }

    #[test]
    fn test_stack_resource_with_missing_fields() {
        let resource = types::StackResource::builder()
            .physical_resource_id("")
            .build();

        let converted = stack_resource(&resource);
        assert_eq!(converted.logical_resource_id, "");
        assert_eq!(converted.resource_type, "");
        assert_eq!(converted.resource_status, "N/A");
        assert_eq!(converted.physical_resource_id, None);
    }
}
