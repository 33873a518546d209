// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `element.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_support::{mutating_config, service_config, url_config, validating_config};
    use k8s_openapi::ByteString;
    use serde_json::json;

    #[test]
    fn test_kind_is_fixed_by_variant() {
        let mutating = WebhookConfigElement::from(mutating_config("m", &[], &[]));
        let validating = WebhookConfigElement::from(validating_config("v", &[], &[]));

        assert_eq!(mutating.kind(), WebhookKind::Mutating);
        assert_eq!(validating.kind(), WebhookKind::Validating);
        assert_eq!(mutating.kind().kind_name(), "MutatingWebhookConfiguration");
        assert_eq!(validating.kind().to_string(), "validating");
    }

    #[test]
    fn test_entries_preserve_declaration_order() {
        let element = WebhookConfigElement::from(mutating_config(
            "m",
            &[],
            &[
                ("hook-b", service_config("ns", "svc-b")),
                ("hook-a", url_config("https://a.example.com")),
            ],
        ));

        let names: Vec<&str> = element.entries().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["hook-b", "hook-a"]);
    }

    #[test]
    fn test_entries_mut_writes_through_to_resource() {
        let mut element = WebhookConfigElement::from(validating_config(
            "v",
            &[],
            &[("hook-a", service_config("ns", "svc"))],
        ));

        for entry in element.entries_mut() {
            entry.client_config.ca_bundle = Some(ByteString(b"CA".to_vec()));
        }

        let config = element.as_validating().unwrap();
        let webhooks = config.webhooks.as_ref().unwrap();
        assert_eq!(
            webhooks[0].client_config.ca_bundle,
            Some(ByteString(b"CA".to_vec()))
        );
    }

    #[test]
    fn test_clone_is_independent_of_original() {
        let original = WebhookConfigElement::from(mutating_config(
            "m",
            &[],
            &[("hook-a", service_config("ns", "svc"))],
        ));
        let mut cloned = original.clone();
        assert!(original.equals(&cloned));

        cloned.entries_mut()[0].client_config.ca_bundle = Some(ByteString(b"X".to_vec()));

        assert!(!original.equals(&cloned));
        assert_eq!(original.entries()[0].client_config.ca_bundle, None);
    }

    #[test]
    fn test_equals_across_variants_is_false() {
        let mutating = WebhookConfigElement::from(mutating_config("same", &[], &[]));
        let validating = WebhookConfigElement::from(validating_config("same", &[], &[]));

        assert!(!mutating.equals(&validating));
        assert!(!validating.equals(&mutating));
    }

    #[test]
    fn test_downcast_wrong_variant() {
        let mutating = WebhookConfigElement::from(mutating_config("m", &[], &[]));
        assert!(mutating.as_mutating().is_ok());
        assert!(matches!(
            mutating.as_validating(),
            Err(SyncError::WrongVariant {
                expected: "validating",
                found: "mutating"
            })
        ));

        let validating = WebhookConfigElement::from(validating_config("v", &[], &[]));
        assert!(validating.as_validating().is_ok());
        assert!(matches!(
            validating.as_mutating(),
            Err(SyncError::WrongVariant { .. })
        ));
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut config = mutating_config("m", &[], &[]);
        let element = WebhookConfigElement::from(config.clone());
        assert!(element.owner_reference().is_none());

        config.metadata.uid = Some("1234".to_string());
        let owner = WebhookConfigElement::from(config).owner_reference().unwrap();
        assert_eq!(owner.api_version, "admissionregistration.k8s.io/v1");
        assert_eq!(owner.kind, "MutatingWebhookConfiguration");
        assert_eq!(owner.name, "m");
        assert_eq!(owner.uid, "1234");
    }

    #[test]
    fn test_try_from_dynamic_object_mutating() {
        let obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": {
                "name": "dyn",
                "annotations": {
                    "secret.certprovisioner.kubernetes.io/hook-a": "ns1/sec-a"
                }
            },
            "webhooks": [{
                "name": "hook-a",
                "admissionReviewVersions": ["v1"],
                "sideEffects": "None",
                "clientConfig": { "url": "https://hook.example.com/mutate" }
            }]
        }))
        .unwrap();

        let element = WebhookConfigElement::try_from(&obj).unwrap();
        assert_eq!(element.kind(), WebhookKind::Mutating);
        assert_eq!(element.name(), "dyn");
        assert_eq!(element.entries()[0].name, "hook-a");
        assert_eq!(element.annotations().unwrap().len(), 1);
    }

    #[test]
    fn test_try_from_dynamic_object_validating() {
        let obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "ValidatingWebhookConfiguration",
            "metadata": { "name": "dyn" }
        }))
        .unwrap();

        let element = WebhookConfigElement::try_from(obj).unwrap();
        assert_eq!(element.kind(), WebhookKind::Validating);
        assert!(element.entries().is_empty());
    }

    #[test]
    fn test_try_from_dynamic_object_unsupported_type() {
        let obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "cm" }
        }))
        .unwrap();

        let err = WebhookConfigElement::try_from(&obj).unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedType { ref kind } if kind == "v1/ConfigMap"));
    }

    #[test]
    fn test_try_from_dynamic_object_wrong_group() {
        let obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "example.com/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": { "name": "fake" }
        }))
        .unwrap();

        assert!(matches!(
            WebhookConfigElement::try_from(&obj),
            Err(SyncError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_try_from_dynamic_object_without_types() {
        let obj = DynamicObject {
            types: None,
            metadata: ObjectMeta::default(),
            data: json!({}),
        };

        assert!(matches!(
            WebhookConfigElement::try_from(&obj),
            Err(SyncError::UnsupportedType { .. })
        ));
    }
}
