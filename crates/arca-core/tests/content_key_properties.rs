//! # Content Key Properties
//!
//! Property tests for the serialization independence of [`ContentKey`]:
//! every serialization of one multihash must map to the same key, and the
//! key must survive a trip through the identifier's string form.

use arca_core::{canonical_key, collect, difference, ArtifactLatestState, ContentId, ContentSet};
use cid::multibase::Base;
use cid::multihash::Multihash;
use cid::Cid;
use proptest::prelude::*;

const SHA2_256: u64 = 0x12;
const DAG_PB: u64 = 0x70;

fn multihash(digest: &[u8; 32]) -> Multihash<64> {
    Multihash::wrap(SHA2_256, digest).unwrap()
}

proptest! {
    #[test]
    fn every_serialization_shares_one_key(digest in any::<[u8; 32]>(), codec in prop_oneof![Just(0x55u64), Just(0x70u64), Just(0x71u64)]) {
        let hash = multihash(&digest);
        let v0 = Cid::new_v0(hash).unwrap();
        let v1 = Cid::new_v1(codec, hash);

        let from_v0 = ContentId::parse(&v0.to_string()).unwrap();
        let from_v1_base32 = ContentId::parse(&v1.to_string()).unwrap();
        let from_v1_base58 = ContentId::parse(&v1.to_string_of_base(Base::Base58Btc).unwrap()).unwrap();

        prop_assert_eq!(canonical_key(&from_v0), canonical_key(&from_v1_base32));
        prop_assert_eq!(canonical_key(&from_v1_base32), canonical_key(&from_v1_base58));
    }

    #[test]
    fn distinct_digests_never_collide(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
        prop_assume!(a != b);
        let ka = ContentId::from_cid(Cid::new_v1(DAG_PB, multihash(&a))).key();
        let kb = ContentId::from_cid(Cid::new_v1(DAG_PB, multihash(&b))).key();
        prop_assert_ne!(ka, kb);
    }

    #[test]
    fn collect_yields_each_key_once(seeds in proptest::collection::vec(0u8..8, 0..24)) {
        let mut artifact = ArtifactLatestState::new("prop");
        for (i, seed) in seeds.iter().enumerate() {
            let hash = multihash(&[*seed; 32]);
            let id = if i % 2 == 0 {
                ContentId::from_cid(Cid::new_v0(hash).unwrap())
            } else {
                ContentId::from_cid(Cid::new_v1(DAG_PB, hash))
            };
            artifact.assign(&format!("f{i:02}"), id);
        }
        let unique = collect(std::slice::from_ref(&artifact));
        let keys: ContentSet = unique.iter().collect();
        prop_assert_eq!(keys.len(), unique.len());

        let all: ContentSet = artifact.files().values().collect();
        prop_assert_eq!(keys, all.clone());
        prop_assert!(difference(&all, &unique).is_empty());
    }
}
