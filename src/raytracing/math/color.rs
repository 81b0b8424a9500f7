use std::ops;

/// Linear RGB color. Channels are nominally in [0, 1] but are only clamped
/// when a pixel is written out.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ops::Add<Rgb> for Rgb {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Rgb) -> Self::Output {
        Rgb {
            red: self.red + rhs.red,
            green: self.green + rhs.green,
            blue: self.blue + rhs.blue,
        }
    }
}

impl ops::AddAssign<Rgb> for Rgb {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Rgb) {
        self.red += rhs.red;
        self.green += rhs.green;
        self.blue += rhs.blue;
    }
}

impl ops::Mul<f64> for Rgb {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Self::Output {
        self.coef(rhs)
    }
}

impl ops::Mul<Rgb> for Rgb {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Rgb) -> Self::Output {
        self.mix(rhs)
    }
}

impl Rgb {
    #[inline(always)]
    pub fn new(red: f64, green: f64, blue: f64) -> Rgb {
        Rgb { red, green, blue }
    }

    #[inline(always)]
    pub fn black() -> Rgb {
        Rgb::new(0.0, 0.0, 0.0)
    }

    /// Scale every channel by `c`.
    #[inline(always)]
    pub fn coef(self, c: f64) -> Rgb {
        Rgb::new(self.red * c, self.green * c, self.blue * c)
    }

    /// Channel-wise product.
    #[inline(always)]
    pub fn mix(self, other: Rgb) -> Rgb {
        Rgb::new(
            self.red * other.red,
            self.green * other.green,
            self.blue * other.blue,
        )
    }

    /// Channel-wise mean of two colors, used by the preview down-sampler.
    #[inline(always)]
    pub fn realmix(self, other: Rgb) -> Rgb {
        Rgb::new(
            (self.red + other.red) / 2.0,
            (self.green + other.green) / 2.0,
            (self.blue + other.blue) / 2.0,
        )
    }

    /// Cap every channel at 1. Illumination never goes negative so there is
    /// no lower clamp here.
    #[inline(always)]
    pub fn clamp_high(self) -> Rgb {
        Rgb::new(self.red.min(1.0), self.green.min(1.0), self.blue.min(1.0))
    }

    /// 8-bit channel values: `round(255 * clamp(c, 0, 1))`.
    pub fn to_bytes(self) -> [u8; 3] {
        let to_u8 = |c: f64| (255.0 * c.clamp(0.0, 1.0)).round() as u8;
        [to_u8(self.red), to_u8(self.green), to_u8(self.blue)]
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(value: Rgb) -> Self {
        image::Rgb(value.to_bytes())
    }
}
