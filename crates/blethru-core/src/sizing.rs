//! Message-size negotiation
//!
//! Two pure functions derive per-message payload sizes from the link-layer
//! packet (PDU) size and the negotiated message-size limit (MTU). The
//! best-effort size packs messages into whole link-layer packets to minimize
//! wasted radio capacity; the ack size is a plain clamp, since that stream is
//! rate-limited by confirmations anyway.

/// Per-message operation header, both channels
pub const ATT_HEADER: u16 = 3;

/// Lower-layer header carried in the first packet of a message
pub const L2CAP_HEADER: u16 = 4;

// ----------------------------------------------------------------------------
// Size Negotiation
// ----------------------------------------------------------------------------

/// Optimal best-effort message size for the given PDU size and MTU.
///
/// With no cap configured (`cap == 0`, or a cap that exceeds what the MTU can
/// carry), the size is chosen so a message plus its headers fills a whole
/// number of link-layer packets. Returns 0 until both parameters are known,
/// and for degenerate values too small to carry any payload.
pub fn best_effort_size(pdu_size: u16, mtu: u16, cap: u16) -> u16 {
    if cap != 0 && cap <= mtu.saturating_sub(ATT_HEADER) {
        return cap;
    }
    // A PDU that cannot hold its own headers, or an MTU below the operation
    // header, carries no payload; treat either as not yet known.
    if pdu_size <= L2CAP_HEADER + ATT_HEADER || mtu <= ATT_HEADER {
        return 0;
    }
    if pdu_size <= mtu {
        // First packet carries both headers; every further whole packet is
        // pure payload.
        let first = pdu_size - (L2CAP_HEADER + ATT_HEADER);
        let rest = (mtu - pdu_size + L2CAP_HEADER) / pdu_size * pdu_size;
        first + rest
    } else if pdu_size - mtu <= L2CAP_HEADER {
        // Single packet, but no room for the headers beside a full MTU.
        pdu_size - (L2CAP_HEADER + ATT_HEADER)
    } else {
        // Whole MTU fits in one packet with room to spare.
        mtu - ATT_HEADER
    }
}

/// Ack message size: the negotiated limit minus the operation header, unless
/// a smaller explicit cap is configured.
pub fn ack_size(mtu: u16, cap: u16) -> u16 {
    let max = mtu.saturating_sub(ATT_HEADER);
    if cap != 0 && cap <= max {
        cap
    } else {
        max
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn packing_beats_single_packet_sizing() {
        // pdu 27, mtu 247: the packing formula must exceed what a
        // single-packet-only sizing would give, demonstrating the
        // multi-packet benefit.
        let packed = best_effort_size(27, 247, 0);
        let single_packet = 27 - (L2CAP_HEADER + ATT_HEADER);
        assert!(packed > single_packet, "packed={packed}");
        assert!(packed <= 247 - ATT_HEADER);
    }

    #[test]
    fn large_pdu_uses_full_mtu() {
        // pdu 251 > mtu 247 by 4 = L2CAP header: message fills the PDU
        assert_eq!(best_effort_size(251, 247, 0), 251 - L2CAP_HEADER - ATT_HEADER);
        // pdu far larger than mtu: whole MTU fits in one packet
        assert_eq!(best_effort_size(251, 100, 0), 100 - ATT_HEADER);
    }

    #[test]
    fn explicit_cap_wins_when_it_fits() {
        assert_eq!(best_effort_size(27, 247, 100), 100);
        assert_eq!(ack_size(247, 100), 100);
        // A cap beyond what the MTU carries falls back to the computed size
        assert_eq!(ack_size(247, 250), 247 - ATT_HEADER);
    }

    #[test]
    fn unknown_parameters_yield_zero() {
        assert_eq!(best_effort_size(0, 247, 0), 0);
        assert_eq!(best_effort_size(27, 0, 0), 0);
        assert_eq!(ack_size(0, 0), 0);
    }

    #[test]
    fn degenerate_parameters_yield_zero_without_wrapping() {
        // A PDU smaller than its headers, or an MTU at or below the
        // operation header, must not wrap the subtraction.
        assert_eq!(best_effort_size(5, 247, 0), 0);
        assert_eq!(best_effort_size(7, 247, 0), 0);
        assert_eq!(best_effort_size(251, 2, 0), 0);
        assert_eq!(best_effort_size(5, 2, 0), 0);
        assert_eq!(ack_size(2, 0), 0);
    }

    proptest! {
        #[test]
        fn arbitrary_parameters_never_panic_and_stay_bounded(
            pdu in 0u16..=600,
            mtu in 0u16..=600,
            cap in 0u16..=255,
        ) {
            let be = best_effort_size(pdu, mtu, cap);
            prop_assert!(be <= mtu.saturating_sub(ATT_HEADER));
            if cap == 0 && pdu > L2CAP_HEADER + ATT_HEADER && mtu > ATT_HEADER {
                prop_assert!(be > 0);
            }
            prop_assert!(ack_size(mtu, cap) <= mtu.saturating_sub(ATT_HEADER));
        }

        #[test]
        fn sizes_are_positive_and_bounded(
            pdu in 8u16..=251,
            mtu in 4u16..=517,
        ) {
            let be = best_effort_size(pdu, mtu, 0);
            prop_assert!(be > 0);
            prop_assert!(be <= mtu - ATT_HEADER);

            let ack = ack_size(mtu, 0);
            prop_assert!(ack > 0);
            prop_assert!(ack == mtu - ATT_HEADER);
        }

        #[test]
        fn sizing_is_idempotent(pdu in 12u16..=251, mtu in 23u16..=517, cap in 0u16..=255) {
            prop_assert_eq!(
                best_effort_size(pdu, mtu, cap),
                best_effort_size(pdu, mtu, cap)
            );
            prop_assert_eq!(ack_size(mtu, cap), ack_size(mtu, cap));
        }
    }
}
