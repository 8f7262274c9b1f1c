//! Moduli of the fields used by common curves and MACs.

use std::fmt;

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::One;

fn pow2(bits: u32) -> BigUint {
    BigUint::one() << bits
}

fn from_hex(hex: &str) -> BigUint {
    // Inputs are compile-time constants below; a bad digit yields zero and
    // trips the moduli test.
    BigUint::parse_bytes(hex.as_bytes(), 16).unwrap_or_default()
}

lazy_static! {
    /// 2^256 - 2^224 + 2^192 + 2^96 - 1
    static ref P256: BigUint = pow2(256) - pow2(224) + pow2(192) + pow2(96) - BigUint::one();
    /// 2^384 - 2^128 - 2^96 + 2^32 - 1
    static ref P384: BigUint = pow2(384) - pow2(128) - pow2(96) + pow2(32) - BigUint::one();
    /// 2^521 - 1
    static ref P521: BigUint = pow2(521) - BigUint::one();
    /// 2^255 - 19
    static ref CURVE25519: BigUint = pow2(255) - BigUint::from(19u32);
    /// 2^448 - 2^224 - 1
    static ref CURVE448: BigUint = pow2(448) - pow2(224) - BigUint::one();
    /// 2^130 - 5
    static ref POLY1305: BigUint = pow2(130) - BigUint::from(5u32);

    static ref P256_ORDER: BigUint =
        from_hex("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");
    static ref P384_ORDER: BigUint = from_hex(
        "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973",
    );
    static ref P521_ORDER: BigUint = from_hex(
        "01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffa\
         51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409",
    );
    /// 2^252 + 27742317777372353535851937790883648493
    static ref CURVE25519_ORDER: BigUint =
        pow2(252) + from_hex("14def9dea2f79cd65812631a5cf5d3ed");
    /// 2^446 - 13818066809895115352007386748515426880336692474882178609894547503885
    static ref CURVE448_ORDER: BigUint =
        pow2(446) - from_hex("8335dc163bb124b65129c96fde933d8d723a70aadc873d6d54a7bb0d");
}

/// A well-known prime modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownPrime {
    P256,
    P384,
    P521,
    Curve25519,
    Curve448,
    Poly1305,
    P256Order,
    P384Order,
    P521Order,
    Curve25519Order,
    Curve448Order,
}

impl KnownPrime {
    pub const ALL: [KnownPrime; 11] = [
        KnownPrime::P256,
        KnownPrime::P384,
        KnownPrime::P521,
        KnownPrime::Curve25519,
        KnownPrime::Curve448,
        KnownPrime::Poly1305,
        KnownPrime::P256Order,
        KnownPrime::P384Order,
        KnownPrime::P521Order,
        KnownPrime::Curve25519Order,
        KnownPrime::Curve448Order,
    ];

    pub fn modulus(self) -> &'static BigUint {
        match self {
            KnownPrime::P256 => &P256,
            KnownPrime::P384 => &P384,
            KnownPrime::P521 => &P521,
            KnownPrime::Curve25519 => &CURVE25519,
            KnownPrime::Curve448 => &CURVE448,
            KnownPrime::Poly1305 => &POLY1305,
            KnownPrime::P256Order => &P256_ORDER,
            KnownPrime::P384Order => &P384_ORDER,
            KnownPrime::P521Order => &P521_ORDER,
            KnownPrime::Curve25519Order => &CURVE25519_ORDER,
            KnownPrime::Curve448Order => &CURVE448_ORDER,
        }
    }

    /// Length of the byte encoding of an element. Poly1305 uses 16 bytes
    /// and carries its top bits in the high byte.
    pub fn field_bytes(self) -> usize {
        match self {
            KnownPrime::P256 | KnownPrime::P256Order => 32,
            KnownPrime::P384 | KnownPrime::P384Order => 48,
            KnownPrime::P521 | KnownPrime::P521Order => 66,
            KnownPrime::Curve25519 | KnownPrime::Curve25519Order => 32,
            KnownPrime::Curve448 | KnownPrime::Curve448Order => 56,
            KnownPrime::Poly1305 => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KnownPrime::P256 => "P-256",
            KnownPrime::P384 => "P-384",
            KnownPrime::P521 => "P-521",
            KnownPrime::Curve25519 => "Curve25519",
            KnownPrime::Curve448 => "Curve448",
            KnownPrime::Poly1305 => "Poly1305",
            KnownPrime::P256Order => "P-256 order",
            KnownPrime::P384Order => "P-384 order",
            KnownPrime::P521Order => "P-521 order",
            KnownPrime::Curve25519Order => "Curve25519 order",
            KnownPrime::Curve448Order => "Curve448 order",
        }
    }
}

impl fmt::Display for KnownPrime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer;

    #[test]
    fn test_moduli_bit_lengths() {
        let expected = [
            (KnownPrime::P256, 256),
            (KnownPrime::P384, 384),
            (KnownPrime::P521, 521),
            (KnownPrime::Curve25519, 255),
            (KnownPrime::Curve448, 448),
            (KnownPrime::Poly1305, 130),
            (KnownPrime::P256Order, 256),
            (KnownPrime::P384Order, 384),
            (KnownPrime::P521Order, 521),
            (KnownPrime::Curve25519Order, 253),
            (KnownPrime::Curve448Order, 446),
        ];
        for (prime, bits) in expected {
            assert_eq!(prime.modulus().bits(), bits, "{}", prime);
            assert!(prime.modulus().is_odd(), "{}", prime);
        }
    }

    #[test]
    fn test_field_bytes_cover_modulus() {
        for prime in KnownPrime::ALL {
            // The byte window plus the high byte always holds p - 1.
            assert!((prime.field_bytes() as u64 + 1) * 8 >= prime.modulus().bits());
        }
    }

    #[test]
    fn test_p256_modulus() {
        assert_eq!(
            *KnownPrime::P256.modulus(),
            from_hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff")
        );
    }
}
