use ieee802154_security::{
    ccm::SoftwareCipher,
    security::{AddrMode, Config, SecurityContext},
};

const PAN_ID: u16 = 0x0023;
const KEY: [u8; 16] = *b"pizza_margherita";
const ADDRESS_A: [u8; 8] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];
const SHORT_A: u16 = 0x0001;
const SHORT_B: u16 = 0x0002;
const ADDRESS_B: [u8; 8] = [0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

fn main() {
    let config = Config {
        replay_protection: true,
        ..Config::default()
    };

    // Node A ----------------------------------------------------------------
    let a: SecurityContext<SoftwareCipher> =
        SecurityContext::with_config(SoftwareCipher, config);
    let a_key = a.add_key(&KEY).unwrap();
    let a_peer = a.add_dev(PAN_ID, SHORT_B, &ADDRESS_B).unwrap();
    // A addresses B by its short address
    let a_rule = a
        .add_key_lookup_implicit(a_key, a_peer, AddrMode::Short)
        .unwrap();
    a.peer_dev(a_rule, a_peer).unwrap();

    // Node B ----------------------------------------------------------------
    let b = SecurityContext::new(SoftwareCipher);
    b.set_config(config);
    let b_key = b.add_key(&KEY).unwrap();
    let b_peer = b.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
    // B sees A's long address as the source
    let b_rule = b
        .add_key_lookup_implicit(b_key, b_peer, AddrMode::Long)
        .unwrap();
    b.peer_dev(b_rule, b_peer).unwrap();

    // Data frame with security enabled and PAN ID compression, from A's long
    // address to B's short address
    let mut header = [0; 32];
    let mhr = [
        0x49, 0xC8, 0x01, 0x23, 0x00, 0x02, 0x00, 0x77, 0x66, 0x55, 0x44, 0x33,
        0x22, 0x11, 0x00,
    ];
    header[..mhr.len()].copy_from_slice(&mhr);
    let mut payload = *b"Hello";
    let mut mic = [0; 16];

    let secured = a
        .encrypt(&mut header, mhr.len(), &mut payload, &mut mic, &ADDRESS_A)
        .unwrap();
    let mut frame = header[..secured.header_len].to_vec();
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&mic[..secured.mic_len]);
    println!("Secured frame: {}", hex(&frame));

    let unsecured = b.decrypt(&mut frame, mhr.len()).unwrap();
    println!(
        "Unsecured payload: {}",
        String::from_utf8_lossy(&frame[unsecured.payload()])
    );
    println!(
        "Next frame counter expected from A: {}",
        b.dev_frame_counter(b_peer).unwrap()
    );
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<String>>()
        .join(" ")
}
