use std::collections::BTreeSet;

use proptest::prelude::*;

use jobdex::codec::block::CompressionLevel;
use jobdex::codec::{ByteReader, compress, decode_postings, decompress, encode_postings};
use jobdex::codec::{read_varint, write_varint};
use jobdex::index::artifact;
use jobdex::index::SkillDictionary;

proptest! {
    #[test]
    fn test_varint_roundtrip(value in any::<u64>()) {
        let mut buf = Vec::new();
        write_varint(value, &mut buf);
        let (decoded, used) = read_varint(&buf).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(used, buf.len());
    }

    #[test]
    fn test_postings_roundtrip(offsets in prop::collection::btree_set(any::<u64>(), 1..200)) {
        let offsets: Vec<u64> = offsets.into_iter().collect();
        let mut buf = Vec::new();
        encode_postings(&offsets, &mut buf).unwrap();
        let mut reader = ByteReader::new(&buf);
        prop_assert_eq!(decode_postings(&mut reader).unwrap(), offsets);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_postings_never_decode(
        offsets in prop::collection::btree_set(0u64..1_000_000, 1..50),
        cut in any::<prop::sample::Index>(),
    ) {
        let offsets: Vec<u64> = offsets.into_iter().collect();
        let mut buf = Vec::new();
        encode_postings(&offsets, &mut buf).unwrap();
        let keep = cut.index(buf.len());
        let mut reader = ByteReader::new(&buf[..keep]);
        prop_assert!(decode_postings(&mut reader).is_err());
    }

    #[test]
    fn test_block_roundtrip(payload in prop::collection::vec(any::<u8>(), 1..4096), level in 1i32..6) {
        let artifact = compress(&payload, CompressionLevel(level)).unwrap();
        prop_assert_eq!(&artifact[..8], &(payload.len() as u64).to_le_bytes()[..]);
        prop_assert_eq!(decompress(&artifact).unwrap(), payload);
    }

    #[test]
    fn test_artifact_payload_roundtrip(
        entries in prop::collection::btree_map("[A-Za-z+#. ]{1,12}", prop::collection::btree_set(0u64..100_000, 1..20), 1..40)
    ) {
        let mut dict = SkillDictionary::with_capacity(16);
        for (skill, offsets) in &entries {
            for &offset in offsets.iter().rev() {
                dict.add_offset(skill, offset);
            }
        }
        let decoded = artifact::deserialize(&artifact::serialize(&dict).unwrap()).unwrap();
        prop_assert_eq!(decoded.len(), entries.len());
        for (skill, offsets) in &entries {
            let expected: Vec<u64> = offsets.iter().copied().collect();
            prop_assert_eq!(decoded.get(skill).unwrap(), expected.as_slice());
        }
    }

    #[test]
    fn test_dictionary_matches_btreeset(pairs in prop::collection::vec(("[a-e]{1,3}", 0u64..500), 0..300)) {
        let mut dict = SkillDictionary::with_capacity(16);
        let mut model: std::collections::BTreeMap<String, BTreeSet<u64>> = Default::default();
        for (skill, offset) in &pairs {
            dict.add_offset(skill, *offset);
            model.entry(skill.clone()).or_default().insert(*offset);
        }
        prop_assert_eq!(dict.len(), model.len());
        for (skill, offsets) in &model {
            let expected: Vec<u64> = offsets.iter().copied().collect();
            prop_assert_eq!(dict.get(skill).unwrap(), expected.as_slice());
        }
    }
}
