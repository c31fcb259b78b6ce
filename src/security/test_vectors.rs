// Two nodes in PAN 0x0023: A with long address 00:11:22:33:44:55:66:77 and
// short address 0x0001, B with long address 88:99:AA:BB:CC:DD:EE:FF and
// short address 0x0002.

pub const PAN_ID: u16 = 0x0023;
pub const SHORT_A: u16 = 0x0001;
pub const SHORT_B: u16 = 0x0002;
pub const ADDRESS_A: [u8; 8] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];
pub const ADDRESS_A_WIRE: [u8; 8] =
    [0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00];
pub const ADDRESS_B: [u8; 8] = [0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
pub const ADDRESS_B_WIRE: [u8; 8] =
    [0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88];

pub const KEY: [u8; 16] = *b"pizza_margherita";
pub const PLAINTEXT: [u8; 5] = *b"Hello";

// Data frame, security enabled, PAN ID compression, short destination B,
// long source A
pub const HEADER_A_TO_B: [u8; 15] = [
    0x49, 0xC8, 0x2A, 0x23, 0x00, 0x02, 0x00, 0x77, 0x66, 0x55, 0x44, 0x33,
    0x22, 0x11, 0x00,
];
// Data frame, security enabled, PAN ID compression, long destination A,
// short source B
pub const HEADER_B_TO_A: [u8; 15] = [
    0x49, 0x8C, 0x2B, 0x23, 0x00, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11,
    0x00, 0x02, 0x00,
];

// "Hello" from A to B with ENC-MIC-64, implicit key identifier and frame
// counter 0
pub const AUX_HEADER_A_TO_B: [u8; 5] = [0x06, 0x00, 0x00, 0x00, 0x00];
pub const CIPHERTEXT_A_TO_B: [u8; 5] = [0x8F, 0xD1, 0xD3, 0x22, 0x79];
pub const MIC_A_TO_B: [u8; 8] =
    [0x83, 0x5A, 0x89, 0x14, 0xC3, 0xCC, 0xA6, 0xA6];
// The same with frame counter 1
pub const CIPHERTEXT_A_TO_B_1: [u8; 5] = [0x32, 0x0F, 0xFB, 0x87, 0xF5];
pub const MIC_A_TO_B_1: [u8; 8] =
    [0xD8, 0x2F, 0x3E, 0xDB, 0x04, 0x53, 0x52, 0xA7];
