//! Coefficient fields for extracted matrices.
//!
//! A coefficient is always non-zero: a zero entry is represented by leaving it out of the column.
//! [`Z2`] is the usual choice, in which case boundary signs collapse to `1`.
//! Odd prime fields are provided by [`ZP`] for callers whose reduction needs orientation.

use std::fmt::{self, Debug, Display};
use std::num::NonZeroU8;
use std::ops::{Add, Mul};

pub trait NonZeroCoefficient:
    Eq
    + Sized
    + Copy
    + Debug
    + Add<Option<Self>, Output = Option<Self>>
    + Add<Self, Output = Option<Self>>
    + Mul<Self, Output = Self>
{
    fn one() -> Self;
    fn additive_inverse(self) -> Self;

    /// `(-1)^i`, the coefficient of the face obtained by dropping vertex `i`.
    fn parity(i: usize) -> Self {
        if i % 2 == 0 {
            Self::one()
        } else {
            Self::one().additive_inverse()
        }
    }

    /// Smallest absolute value representative, e.g. `2` in Z3 is reported as `-1`.
    fn representative(self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Z2;

impl Add<Z2> for Z2 {
    type Output = Option<Z2>;

    // 1 + 1 = 0
    fn add(self, _rhs: Z2) -> Self::Output {
        None
    }
}

impl Add<Option<Z2>> for Z2 {
    type Output = Option<Z2>;

    fn add(self, rhs: Option<Z2>) -> Self::Output {
        match rhs {
            None => Some(self),
            Some(rhs) => self + rhs,
        }
    }
}

impl Mul<Z2> for Z2 {
    type Output = Z2;

    fn mul(self, _rhs: Z2) -> Self::Output {
        Z2
    }
}

impl NonZeroCoefficient for Z2 {
    fn one() -> Self {
        Z2
    }

    fn additive_inverse(self) -> Self {
        Z2
    }

    fn representative(self) -> i64 {
        1
    }
}

impl Display for Z2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("1")
    }
}

/// The prime field `Z_p`.
/// Arithmetic is carried out in `u16` so no intermediate result overflows.
///
/// Constructing a value with a `P` that is not prime fails to compile.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZP<const P: u8>(NonZeroU8);

const fn is_prime(p: u8) -> bool {
    if p < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= p as u16 {
        if p as u16 % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

impl<const P: u8> ZP<P> {
    const PRIME_MODULUS: () = assert!(is_prime(P), "ZP<P> requires a prime P");

    /// Returns `None` when `value` is `0 mod p`.
    pub fn new(value: u8) -> Option<Self> {
        let () = Self::PRIME_MODULUS;
        NonZeroU8::new(value % P).map(Self)
    }

    pub fn value(self) -> u8 {
        self.0.get()
    }
}

impl<const P: u8> Debug for ZP<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<const P: u8> Display for ZP<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.representative())
    }
}

impl<const P: u8> Add<ZP<P>> for ZP<P> {
    type Output = Option<ZP<P>>;

    fn add(self, rhs: ZP<P>) -> Self::Output {
        let sum = (u16::from(self.value()) + u16::from(rhs.value())) % u16::from(P);
        NonZeroU8::new(sum as u8).map(ZP)
    }
}

impl<const P: u8> Add<Option<ZP<P>>> for ZP<P> {
    type Output = Option<ZP<P>>;

    fn add(self, rhs: Option<ZP<P>>) -> Self::Output {
        match rhs {
            None => Some(self),
            Some(rhs) => self + rhs,
        }
    }
}

impl<const P: u8> Mul<ZP<P>> for ZP<P> {
    type Output = ZP<P>;

    fn mul(self, rhs: ZP<P>) -> Self::Output {
        let product = (u16::from(self.value()) * u16::from(rhs.value())) % u16::from(P);
        // p prime and both factors non-zero, so the product is non-zero
        ZP(NonZeroU8::new(product as u8).unwrap_or(NonZeroU8::MIN))
    }
}

impl<const P: u8> NonZeroCoefficient for ZP<P> {
    fn one() -> Self {
        let () = Self::PRIME_MODULUS;
        ZP(NonZeroU8::MIN)
    }

    fn additive_inverse(self) -> Self {
        ZP(NonZeroU8::new(P - self.value()).unwrap_or(NonZeroU8::MIN))
    }

    fn representative(self) -> i64 {
        let value = i64::from(self.value());
        if 2 * value > i64::from(P) {
            value - i64::from(P)
        } else {
            value
        }
    }
}

pub type Z3 = ZP<3>;
pub type Z5 = ZP<5>;
pub type Z7 = ZP<7>;
pub type Z11 = ZP<11>;
pub type Z13 = ZP<13>;

#[cfg(test)]
mod tests {
    use super::{is_prime, NonZeroCoefficient, Z13, Z2, Z3, Z5};

    #[test]
    fn test_add_mod_2() {
        assert_eq!(Z2 + Z2, None);
        assert_eq!(Z2 + None, Some(Z2));
    }

    #[test]
    fn test_parity_mod_2() {
        assert_eq!(Z2::parity(0), Z2::parity(1));
    }

    #[test]
    fn test_add_mod_3() {
        let two = Z3::one() + Z3::one();
        assert_eq!(two, Z3::new(2));
        assert_eq!(Z3::one() + two, None);
    }

    #[test]
    fn test_prod_mod_3() {
        let two = Z3::new(2).unwrap();
        let one = Z3::one();
        assert_eq!(two * one, two);
        assert_eq!(two * two, one);
    }

    #[test]
    fn test_parity_mod_5() {
        assert_eq!(Z5::parity(0).representative(), 1);
        assert_eq!(Z5::parity(1).representative(), -1);
        assert_eq!(Z5::parity(1) + Z5::parity(2), None);
    }

    #[test]
    fn test_zero_is_not_representable() {
        assert_eq!(Z5::new(10), None);
        assert_eq!(Z5::new(7).map(|c| c.value()), Some(2));
    }

    #[test]
    fn test_modulus_primality() {
        let primes: Vec<u8> = (0..=30).filter(|&p| is_prime(p)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(251));
        assert!(!is_prime(255));
    }

    #[test]
    fn test_largest_alias() {
        let twelve = Z13::new(12).unwrap();
        assert_eq!(twelve, Z13::one().additive_inverse());
        assert_eq!(twelve * twelve, Z13::one());
    }
}
