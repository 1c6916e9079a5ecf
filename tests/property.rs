use ethers_core::types::Address;
use proptest::prelude::*;
use safe_core::gas::data_gas;
use safe_core::signature::{adjust_v, SafeSignature, SignatureSet};

fn any_signature_body() -> impl Strategy<Value = [u8; 64]> {
    prop::array::uniform32(any::<u8>()).prop_flat_map(|left| {
        prop::array::uniform32(any::<u8>()).prop_map(move |right| {
            let mut body = [0u8; 64];
            body[..32].copy_from_slice(&left);
            body[32..].copy_from_slice(&right);
            body
        })
    })
}

proptest! {
    #[test]
    fn adjust_v_normalizes_once_and_holds(body in any_signature_body(), v in prop::sample::select(vec![0u8, 1, 27, 28])) {
        let mut signature = body.to_vec();
        signature.push(v);

        let once = adjust_v(&signature, false).unwrap();
        prop_assert!(once[64] == 27 || once[64] == 28);
        prop_assert_eq!(&once[..64], &signature[..64]);

        let twice = adjust_v(&once, false).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn adjust_v_rejects_everything_else(body in any_signature_body(), v in any::<u8>()) {
        prop_assume!(!matches!(v, 0 | 1 | 27 | 28));
        let mut signature = body.to_vec();
        signature.push(v);
        prop_assert!(adjust_v(&signature, false).is_err());
        prop_assert!(adjust_v(&signature, true).is_err());
    }

    #[test]
    fn prefix_flag_adds_four(body in any_signature_body(), v in prop::sample::select(vec![0u8, 1, 27, 28])) {
        let mut signature = body.to_vec();
        signature.push(v);
        let plain = adjust_v(&signature, false).unwrap();
        let prefixed = adjust_v(&signature, true).unwrap();
        prop_assert_eq!(prefixed[64], plain[64] + 4);
    }

    #[test]
    fn signature_encoding_is_sorted_by_address(addresses in prop::collection::hash_set(prop::array::uniform20(any::<u8>()), 1..8)) {
        let mut set = SignatureSet::new();
        for (i, bytes) in addresses.iter().enumerate() {
            set.add(SafeSignature::eth_sign(Address::from(*bytes), vec![i as u8; 65]));
        }
        prop_assert_eq!(set.len(), addresses.len());

        let signers: Vec<Address> = set.signers().collect();
        let mut sorted = signers.clone();
        sorted.sort();
        prop_assert_eq!(&signers, &sorted);

        // Concatenation follows the same order
        let encoded = set.encoded();
        prop_assert_eq!(encoded.len(), signers.len() * 65);
        for (i, signer) in signers.iter().enumerate() {
            let expected = &set.get(*signer).unwrap().data;
            prop_assert_eq!(&encoded[i * 65..(i + 1) * 65], &expected[..]);
        }
    }

    #[test]
    fn later_signature_replaces_earlier(address in prop::array::uniform20(any::<u8>()), first in any::<u8>(), second in any::<u8>()) {
        let owner = Address::from(address);
        let mut set = SignatureSet::new();
        set.add(SafeSignature::eth_sign(owner, vec![first; 65]));
        set.add(SafeSignature::eth_sign(owner, vec![second; 65]));
        prop_assert_eq!(set.len(), 1);
        prop_assert_eq!(set.get(owner).unwrap().data[0], second);
    }

    #[test]
    fn data_gas_matches_per_byte_pricing(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let zeros = data.iter().filter(|b| **b == 0).count() as u64;
        let total = data.len() as u64;
        prop_assert_eq!(data_gas(&data), zeros * 4 + (total - zeros) * 16);
    }
}
