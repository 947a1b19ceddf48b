//! Property tests for the pass-consumption contracts

use cca_gate::{get_pass0_throttle, get_pass2_routing, Route};
use cca_model::{apply_ceiling, AutomationClass, CapabilityProfile, CcaView, Confidence, DocumentQuality};
use cca_test_utils::{fixed_now, profile};
use chrono::Duration;
use proptest::prelude::*;

fn confidence() -> impl Strategy<Value = Confidence> {
    prop_oneof![Just(Confidence::Low), Just(Confidence::Medium), Just(Confidence::High)]
}

fn class() -> impl Strategy<Value = AutomationClass> {
    prop_oneof![
        Just(AutomationClass::Api),
        Just(AutomationClass::Portal),
        Just(AutomationClass::Pdf),
        Just(AutomationClass::Manual),
    ]
}

fn quality() -> impl Strategy<Value = DocumentQuality> {
    prop_oneof![
        Just(DocumentQuality::StructuredHtml),
        Just(DocumentQuality::SearchablePdf),
        Just(DocumentQuality::ScannedPdf),
        Just(DocumentQuality::None),
        Just(DocumentQuality::Unknown),
    ]
}

/// Any profile, possibly expired
fn any_profile() -> impl Strategy<Value = CapabilityProfile> {
    (class(), any::<bool>(), confidence(), quality(), any::<bool>()).prop_map(
        |(class, viable, ceiling, quality, expired)| {
            let mut p = profile(class, viable, ceiling);
            p.document_quality = quality;
            if expired {
                p.expires_at = fixed_now() - Duration::seconds(1);
            }
            p
        },
    )
}

proptest! {
    #[test]
    fn pass0_never_upgrades(p in any_profile(), signal in confidence(), default in confidence()) {
        let view: Option<&dyn CcaView> = Some(&p);
        let decision = get_pass0_throttle(view, default, fixed_now());
        let effective = decision.effective(signal);
        prop_assert!(effective <= signal);
        prop_assert!(effective <= decision.confidence_cap);
        if !p.is_expired(fixed_now()) && decision.allow_full_automation {
            prop_assert!(effective <= apply_ceiling(signal, p.confidence_ceiling));
        }
    }

    #[test]
    fn pass2_never_upgrades(p in any_profile(), signal in confidence(), default in confidence()) {
        let view: Option<&dyn CcaView> = Some(&p);
        let decision = get_pass2_routing(view, default, fixed_now());
        let effective = decision.effective(signal);
        prop_assert!(effective <= signal);
        prop_assert!(effective <= apply_ceiling(signal, p.confidence_ceiling));
    }

    #[test]
    fn retell_never_with_viable_automation(p in any_profile(), default in confidence()) {
        let view: Option<&dyn CcaView> = Some(&p);
        let decision = get_pass2_routing(view, default, fixed_now());
        if decision.route_to == Route::Retell {
            prop_assert!(!p.automation_viable);
        }
        if p.automation_viable && !p.is_expired(fixed_now()) {
            prop_assert_eq!(decision.route_to, Route::Firecrawl);
        }
    }

    #[test]
    fn expired_profiles_behave_as_absent(p in any_profile(), default in confidence()) {
        prop_assume!(p.is_expired(fixed_now()));
        let view: Option<&dyn CcaView> = Some(&p);
        let routed = get_pass2_routing(view, default, fixed_now());
        let absent = get_pass2_routing(None, default, fixed_now());
        prop_assert_eq!(routed.route_to, absent.route_to);
        prop_assert_eq!(routed.confidence_ceiling, absent.confidence_ceiling);

        let throttled = get_pass0_throttle(view, default, fixed_now());
        prop_assert!(!throttled.allow_full_automation);
        prop_assert_eq!(throttled.confidence_cap, Confidence::Low);
    }
}
