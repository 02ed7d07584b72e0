//! Property tests: wrapping never alters tool results, whatever happens to
//! delivery, and the attempt bound holds for every retry budget.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use proptest::prelude::*;
use toolsight::{Config, DeliveryError, Tracker, WrapOptions};
use toolsight_testing::{RecordingTransport, TestClock};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime")
}

fn delivery_error() -> impl Strategy<Value = DeliveryError> {
    prop_oneof![
        Just(DeliveryError::network("connection reset")),
        Just(DeliveryError::timeout(5000)),
        (500_u16..600).prop_map(|status| DeliveryError::server_error(status, "")),
        prop_oneof![Just(400_u16), Just(401), Just(429)]
            .prop_map(|status| DeliveryError::client_error(status, "")),
    ]
}

proptest! {
    #[test]
    fn result_passes_through_failed_delivery(
        a in any::<i32>(),
        b in any::<i32>(),
        retries in 0_u32..5,
        error in delivery_error(),
    ) {
        let transport = RecordingTransport::failing(error.clone());
        let tracker = Tracker::with_transport(
            &Config::new("tk").with_retries(retries),
            Arc::new(transport.clone()),
        )
        .with_clock(Arc::new(TestClock::new()));
        let add = tracker.wrap(
            "add",
            |(a, b): (i32, i32), _meta: Option<()>| async move {
                Ok::<_, std::io::Error>(i64::from(a) + i64::from(b))
            },
            WrapOptions::new(),
        );

        let (result, attempts) = runtime().block_on(async {
            let result = add.call((a, b), None).await.unwrap();
            (result, transport.attempts().await)
        });

        prop_assert_eq!(result, i64::from(a) + i64::from(b));
        let per_event = if error.is_retryable() { retries as usize + 1 } else { 1 };
        prop_assert_eq!(attempts, 2 * per_event);
    }

    #[test]
    fn tool_error_is_returned_unchanged(message in "[a-z ]{0,40}", retries in 0_u32..4) {
        let transport = RecordingTransport::failing(DeliveryError::network("down"));
        let tracker = Tracker::with_transport(
            &Config::new("tk").with_retries(retries),
            Arc::new(transport),
        )
        .with_clock(Arc::new(TestClock::new()));
        let fail = tracker.wrap(
            "fail",
            |message: String, _meta: Option<()>| async move { Err::<u8, _>(message) },
            WrapOptions::new(),
        );

        let result = runtime().block_on(fail.call(message.clone(), None));

        prop_assert_eq!(result, Err(message));
    }
}
