mod common;

use common::*;
use consensus::ChainError;
use consensus_core::constants::STALE_TIP_DELAY_SECS;
use consensus_core::{Hash, ZERO_HASH};

#[test]
fn fresh_main_chain_accepts_genesis() {
    let headers = main_headers(0);
    let node = TestNode::new(simnet_params(&headers[0]));
    let main = node.registry.best_chain().unwrap();

    assert!(main.is_main());
    assert_eq!(main.size(), 0);
    assert_eq!(main.height(), -1);
    assert_eq!(main.get_hash(&node.registry, -1).unwrap(), ZERO_HASH);
    assert_eq!(main.get_hash(&node.registry, 0).unwrap(), headers[0].hash());

    assert!(main.can_connect(&node.registry, &headers[0], true));
    main.save_header(&node.registry, &headers[0]).unwrap();
    assert_eq!(main.height(), 0);
    assert_eq!(main.read_header(&node.registry, 0).unwrap(), Some(headers[0].clone()));
}

#[test]
fn headers_are_only_appended() {
    let headers = main_headers(3);
    let node = TestNode::new(simnet_params(&headers[0]));
    node.save_main(&headers[..2]);
    let main = node.registry.best_chain().unwrap();

    let err = main.save_header(&node.registry, &headers[3]).unwrap_err();
    assert!(matches!(err, ChainError::NotNextHeader { expected: 2, actual: 3 }));
    let err = main.save_header(&node.registry, &headers[1]).unwrap_err();
    assert!(matches!(err, ChainError::NotNextHeader { expected: 2, actual: 1 }));
    assert_eq!(main.height(), 1);
}

#[test]
fn can_connect_checks_height_link_and_pow() {
    let headers = main_headers(3);
    let node = TestNode::new(simnet_params(&headers[0]));
    node.save_main(&headers[..3]);
    let main = node.registry.best_chain().unwrap();
    let registry = &node.registry;

    assert!(main.can_connect(registry, &headers[3], true));
    // below the tip: only passes without the height check
    assert!(!main.can_connect(registry, &headers[2], true));
    assert!(main.can_connect(registry, &headers[2], false));

    let mut unlinked = headers[3].clone();
    unlinked.prev_hash = Hash::from_bytes([9; 32]);
    assert!(!main.can_connect(registry, &mine(unlinked), true));

    let weak = mine_weak(headers[3].clone());
    assert!(!main.can_connect(registry, &weak, true));

    let mut wrong_bits = headers[3].clone();
    wrong_bits.bits = 0x1f00ffff;
    assert!(!main.can_connect(registry, &wrong_bits, true));

    // genesis is recognised by hash alone
    assert!(main.can_connect(registry, &headers[0], false));
    let mut fake_genesis = headers[0].clone();
    fake_genesis.nonce += 1;
    assert!(!main.can_connect(registry, &fake_genesis, false));
}

#[test]
fn read_header_and_get_hash_agree() {
    let headers = main_headers(40);
    let node = TestNode::new(simnet_params(&headers[0]));
    node.save_main(&headers);
    let main = node.registry.best_chain().unwrap();

    for h in main.forkpoint()..main.forkpoint() + main.size() {
        let header = main.read_header(&node.registry, h).unwrap().unwrap();
        assert_eq!(header.height, h);
        assert_eq!(header.hash(), main.get_hash(&node.registry, h).unwrap());
    }
    assert_eq!(main.read_header(&node.registry, 41).unwrap(), None);
    assert!(matches!(main.get_hash(&node.registry, 41), Err(ChainError::MissingHeader(41))));
    assert!(!main.check_hash(&node.registry, 41, &ZERO_HASH));
    assert!(main.check_header(&node.registry, &headers[17]));
}

#[test]
fn tip_staleness() {
    let headers = main_headers(2);
    let node = TestNode::new(simnet_params(&headers[0]));
    let main = node.registry.best_chain().unwrap();
    assert!(main.is_tip_stale_at(&node.registry, 0).unwrap());

    node.save_main(&headers);
    let tip = main.header_at_tip(&node.registry).unwrap().unwrap();
    assert_eq!(tip, headers[2]);
    let tip_time = tip.timestamp as u64;
    assert!(!main.is_tip_stale_at(&node.registry, tip_time + STALE_TIP_DELAY_SECS).unwrap());
    assert!(main.is_tip_stale_at(&node.registry, tip_time + STALE_TIP_DELAY_SECS + 1).unwrap());
    // a 2020 timestamp is long stale by now
    assert!(main.is_tip_stale(&node.registry).unwrap());
}

#[test]
fn registry_lookups() {
    let headers = main_headers(5);
    let node = TestNode::new(simnet_params(&headers[0]));
    node.save_main(&headers[..5]);
    let registry = &node.registry;
    let main = registry.best_chain().unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.can_connect(&headers[5]).unwrap().handle(), main.handle());
    assert!(registry.can_connect(&headers[4]).is_none());
    assert_eq!(registry.check_header(&headers[4]).unwrap().handle(), main.handle());
    assert!(registry.check_header(&headers[5]).is_none());
    assert_eq!(registry.get_by_id(&headers[0].hash()).unwrap().handle(), main.handle());
}

#[test]
fn shortened_file_reports_missing_headers() {
    let headers = main_headers(4);
    let node = TestNode::new(simnet_params(&headers[0]));
    let main = node.registry.best_chain().unwrap();
    let registry = &node.registry;
    node.save_main(&headers);

    // cut the last two records behind the chain's back
    let file = std::fs::OpenOptions::new().write(true).open(main.path()).unwrap();
    file.set_len(3 * 80).unwrap();
    drop(file);

    assert_eq!(main.height(), 4);
    assert_eq!(main.read_header(registry, 2).unwrap(), Some(headers[2].clone()));
    assert!(matches!(main.read_header(registry, 4), Err(ChainError::MissingHeader(4))));
    assert!(matches!(main.get_hash(registry, 3), Err(ChainError::MissingHeader(3))));
    assert!(!main.check_header(registry, &headers[3]));
    assert_eq!(main.read_header(registry, 5).unwrap(), None);
}
