//! Genesis block identities of the known networks.

use crate::Hash;

/// 4d96a915f49d40b1e5c2844d1ee2dccb90013a990ccea12c492d22110489f0c4
pub const MAINNET_GENESIS_HASH: Hash = Hash::from_bytes([
    0xc4, 0xf0, 0x89, 0x04, 0x11, 0x22, 0x2d, 0x49, 0x2c, 0xa1, 0xce, 0x0c, 0x99, 0x3a, 0x01, 0x90,
    0xcb, 0xdc, 0xe2, 0x1e, 0x4d, 0x84, 0xc2, 0xe5, 0xb1, 0x40, 0x9d, 0xf4, 0x15, 0xa9, 0x96, 0x4d,
]);

/// cee8f24feb7a64c8f07916976aa4855decac79b6741a8ec2e32e2747497ad2c9
pub const TESTNET_GENESIS_HASH: Hash = Hash::from_bytes([
    0xc9, 0xd2, 0x7a, 0x49, 0x47, 0x27, 0x2e, 0xe3, 0xc2, 0x8e, 0x1a, 0x74, 0xb6, 0x79, 0xac, 0xec,
    0x5d, 0x85, 0xa4, 0x6a, 0x97, 0x16, 0x79, 0xf0, 0xc8, 0x64, 0x7a, 0xeb, 0x4f, 0xf2, 0xe8, 0xce,
]);
