//! Proptest generators for property-based testing.

use std::time::Duration;

use bytes::Bytes;
use proptest::prelude::*;

use pastegate_core::{Expiration, PasteDraft, PasteId, Permission};

/// Any valid permission mask, including the empty one.
pub fn permission() -> impl Strategy<Value = Permission> {
    (0u32..=Permission::ALL.bits()).prop_map(Permission::from_bits_truncate)
}

/// A permission mask with at least one bit.
pub fn nonempty_permission() -> impl Strategy<Value = Permission> {
    (1u32..=Permission::ALL.bits()).prop_map(Permission::from_bits_truncate)
}

/// A paste id in the shape content stores hand out.
pub fn paste_id() -> impl Strategy<Value = PasteId> {
    "[a-km-z2-9]{5,8}".prop_map(|s| PasteId::new(s).unwrap_or_else(|e| panic!("{e}")))
}

/// A non-empty body of at most `max_len` bytes.
pub fn body(max_len: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1)).prop_map(Bytes::from)
}

/// A requested expiration.
pub fn expiration() -> impl Strategy<Value = Expiration> {
    prop_oneof![
        Just(Expiration::Never),
        (1u64..=60 * 24 * 3600).prop_map(|s| Expiration::After(Duration::from_secs(s))),
    ]
}

/// Parameters for a paste submission.
#[derive(Debug, Clone)]
pub struct DraftParams {
    pub title: Option<String>,
    pub language: Option<String>,
    pub body: Bytes,
    pub expiration: Option<Expiration>,
}

impl DraftParams {
    /// Turn the parameters into a draft.
    pub fn to_draft(&self) -> PasteDraft {
        PasteDraft {
            title: self.title.clone(),
            language: self.language.clone(),
            body: self.body.clone(),
            expiration: self.expiration,
        }
    }
}

impl Arbitrary for DraftParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            proptest::option::of("[A-Za-z0-9 ]{1,24}"),
            proptest::option::of(prop_oneof![
                Just("rust".to_string()),
                Just("py".to_string()),
                Just("markdown".to_string()),
                "[a-z]{3,10}",
            ]),
            body(512),
            proptest::option::of(expiration()),
        )
            .prop_map(|(title, language, body, expiration)| DraftParams {
                title,
                language,
                body,
                expiration,
            })
            .boxed()
    }
}
