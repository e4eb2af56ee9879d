//! Decoder properties: round trips and single-bit corruption.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lfreader::sim::{
    biphase_edges, em4100_edges, em4100_frame_bits, fdxb_edges, fdxb_frame_bits, manchester_edges,
    SimPlatform, EM4100_HALF_BIT_US, FDXB_HALF_BIT_US,
};
use lfreader::{Circuit, Level, PinConfig, Protocol, ReadOutcome, Reader};

fn reader_with_edges(edges: &[(u32, Level)]) -> Reader<SimPlatform> {
    let mut sim = SimPlatform::new();
    sim.schedule_edges(PinConfig::default().demod_primary, 2_000, edges);
    Reader::new(sim)
}

#[test]
fn em4100_round_trips_random_identifiers() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x0041_0001);
    for _ in 0..25 {
        let user: u8 = rng.gen();
        let number: u32 = rng.gen();

        let mut reader = reader_with_edges(&em4100_edges(user, number, 3));
        let tag = reader
            .fast_read(Circuit::Primary, 50, 200)?
            .unwrap_or_else(|| panic!("no decode for user={user:02X} number={number:08X}"));
        assert_eq!(tag.user, user);
        assert_eq!(tag.number, number);
    }
    Ok(())
}

#[test]
fn fdxb_round_trips_random_identifiers() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x0FD_0002);
    for _ in 0..25 {
        let country: u16 = rng.gen_range(0..1024);
        let national_id: u64 = rng.gen_range(0..=0x3F_FFFF_FFFF);
        let extension = [rng.gen(), rng.gen(), rng.gen()];

        let mut reader = reader_with_edges(&fdxb_edges(country, national_id, &extension, 3));
        let tag = reader
            .iso_fast_read(Circuit::Primary, 50, 200)?
            .unwrap_or_else(|| panic!("no decode for country={country} id={national_id:X}"));
        assert_eq!(tag.country, country);
        assert_eq!(tag.national_id, national_id);
        assert_eq!(tag.extension, extension[0]);
    }
    Ok(())
}

#[test]
fn em4100_any_flipped_payload_bit_defeats_parity() -> Result<()> {
    let frame = em4100_frame_bits(0x0F, 0x0102_0304);
    // The 40 payload bits: four data bits in each of the ten rows.
    for row in 0..10 {
        for bit in 0..4 {
            let idx = 9 + row * 5 + bit;
            let mut bits = frame.clone();
            bits[idx] ^= 1;
            let stream: Vec<u8> = bits.iter().cycle().take(bits.len() * 4).copied().collect();

            let mut reader = reader_with_edges(&manchester_edges(&stream, EM4100_HALF_BIT_US));
            let outcome = reader.read(Protocol::Em4100, Circuit::Primary, 50, 150)?;
            assert_eq!(outcome, ReadOutcome::NoTag, "flipped bit {idx} slipped through");
        }
    }
    Ok(())
}

#[test]
fn em4100_flipped_column_parity_bit_defeats_parity() -> Result<()> {
    let frame = em4100_frame_bits(0x0F, 0x0102_0304);
    for col in 0..4 {
        let idx = 9 + 10 * 5 + col;
        let mut bits = frame.clone();
        bits[idx] ^= 1;
        let stream: Vec<u8> = bits.iter().cycle().take(bits.len() * 4).copied().collect();

        let mut reader = reader_with_edges(&manchester_edges(&stream, EM4100_HALF_BIT_US));
        let outcome = reader.read(Protocol::Em4100, Circuit::Primary, 50, 150)?;
        assert_eq!(outcome, ReadOutcome::NoTag, "flipped column bit {col} slipped through");
    }
    Ok(())
}

#[test]
fn fdxb_any_flipped_payload_bit_defeats_the_crc() -> Result<()> {
    let frame = fdxb_frame_bits(276, 0x0001_A2B3_C4D5, &[0x64, 0, 0]);
    // The 64 payload bits: octets 0..=7, eight data bits each.
    for octet in 0..8 {
        for bit in 0..8 {
            let idx = 11 + octet * 9 + bit;
            let mut bits = frame.clone();
            bits[idx] ^= 1;
            let stream: Vec<u8> = bits.iter().cycle().take(bits.len() * 4).copied().collect();

            let mut reader = reader_with_edges(&biphase_edges(&stream, FDXB_HALF_BIT_US));
            let outcome = reader.read(Protocol::Fdxb, Circuit::Primary, 50, 150)?;
            assert_eq!(outcome, ReadOutcome::NoTag, "flipped bit {idx} slipped through");
        }
    }
    Ok(())
}

#[test]
fn fdxb_flipped_crc_bit_defeats_the_comparison() -> Result<()> {
    let frame = fdxb_frame_bits(276, 0x0001_A2B3_C4D5, &[0x64, 0, 0]);
    for trailer_bit in 0..16 {
        let idx = 11 + 8 * 9 + (trailer_bit / 8) * 9 + (trailer_bit % 8);
        let mut bits = frame.clone();
        bits[idx] ^= 1;
        let stream: Vec<u8> = bits.iter().cycle().take(bits.len() * 4).copied().collect();

        let mut reader = reader_with_edges(&biphase_edges(&stream, FDXB_HALF_BIT_US));
        let outcome = reader.read(Protocol::Fdxb, Circuit::Primary, 50, 150)?;
        assert_eq!(outcome, ReadOutcome::NoTag, "flipped CRC bit {trailer_bit} slipped through");
    }
    Ok(())
}
