//! Typed access to a layer descriptor's parameters.

use crate::tilespec::{LayerDescriptor, TilespecError};

/// Largest accepted `a` value; it means "no alpha cap".
pub const MAX_ALPHA_PARAM: u16 = 256;

/// Reads and validates parameters, tracking which ones were used.
///
/// Layer constructors read the keys they understand and then call
/// [`finish`](LayerParams::finish), which rejects anything left over.
pub struct LayerParams<'a> {
    descriptor: &'a LayerDescriptor,
    used: Vec<bool>,
}

impl<'a> LayerParams<'a> {
    /// Wraps a descriptor, rejecting keys given more than once.
    pub fn new(descriptor: &'a LayerDescriptor) -> Result<Self, TilespecError> {
        for (i, (key, value)) in descriptor.params.iter().enumerate() {
            if descriptor.params[..i].iter().any(|(k, _)| k == key) {
                return Err(descriptor.invalid(key, value, "given more than once"));
            }
        }
        Ok(Self {
            descriptor,
            used: vec![false; descriptor.params.len()],
        })
    }

    /// Raw value of `key`, marking it used.
    pub fn take(&mut self, key: &str) -> Option<&'a str> {
        let index = self.descriptor.params.iter().position(|(k, _)| k == key)?;
        self.used[index] = true;
        Some(self.descriptor.params[index].1.as_str())
    }

    /// Alpha cap in `0..=256`; `256` (or absent) means no cap.
    pub fn alpha(&mut self, key: &str) -> Result<Option<u8>, TilespecError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value.parse::<u16>() {
            Ok(MAX_ALPHA_PARAM) => Ok(None),
            Ok(alpha) if alpha < MAX_ALPHA_PARAM => Ok(Some(alpha as u8)),
            _ => Err(self
                .descriptor
                .invalid(key, value, "alpha must be an integer in 0..=256")),
        }
    }

    /// Opacity in `0.0..=1.0`, returned as an alpha cap of `round(o * 255)`.
    pub fn opacity(&mut self, key: &str) -> Result<Option<u8>, TilespecError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value.parse::<f64>() {
            Ok(o) if (0.0..=1.0).contains(&o) => Ok(Some((o * 255.0).round() as u8)),
            _ => Err(self
                .descriptor
                .invalid(key, value, "opacity must be a number in 0.0..=1.0")),
        }
    }

    /// Resample factor, at least 2.
    pub fn resample(&mut self, key: &str) -> Result<Option<u32>, TilespecError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value.parse::<u32>() {
            Ok(factor) if factor >= 2 => Ok(Some(factor)),
            _ => Err(self
                .descriptor
                .invalid(key, value, "resample factor must be an integer >= 2")),
        }
    }

    /// `0`/`1` flag, `false` when absent.
    pub fn flag(&mut self, key: &str) -> Result<bool, TilespecError> {
        match self.take(key) {
            None | Some("0") => Ok(false),
            Some("1") => Ok(true),
            Some(value) => Err(self.descriptor.invalid(key, value, "flag must be 0 or 1")),
        }
    }

    /// Fails on the first parameter no reader asked for.
    pub fn finish(self) -> Result<(), TilespecError> {
        match self
            .descriptor
            .params
            .iter()
            .zip(&self.used)
            .find(|(_, used)| !**used)
        {
            Some(((key, value), _)) => Err(self.descriptor.invalid(
                key,
                value,
                format!("unknown parameter for layer '{}'", self.descriptor.name),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(segment: &str) -> LayerDescriptor {
        LayerDescriptor::parse(segment).unwrap()
    }

    fn reason(err: TilespecError) -> String {
        match err {
            TilespecError::InvalidParameter { reason, .. } => reason,
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_alpha_range() {
        let cases = [
            ("l_a_0", Some(0)),
            ("l_a_64", Some(64)),
            ("l_a_255", Some(255)),
            ("l_a_256", None),
            ("l", None),
        ];
        for (segment, expected) in cases {
            let d = descriptor(segment);
            let mut params = LayerParams::new(&d).unwrap();
            assert_eq!(params.alpha("a").unwrap(), expected, "{}", segment);
        }

        for segment in ["l_a_257", "l_a_-1", "l_a_half"] {
            let d = descriptor(segment);
            let mut params = LayerParams::new(&d).unwrap();
            assert!(params.alpha("a").is_err(), "{}", segment);
        }
    }

    #[test]
    fn test_opacity_range() {
        let d = descriptor("l_o_0.5");
        assert_eq!(LayerParams::new(&d).unwrap().opacity("o").unwrap(), Some(128));

        let d = descriptor("l_o_1");
        assert_eq!(LayerParams::new(&d).unwrap().opacity("o").unwrap(), Some(255));

        for segment in ["l_o_1.01", "l_o_-0.1", "l_o_NaN", "l_o_x"] {
            let d = descriptor(segment);
            assert!(LayerParams::new(&d).unwrap().opacity("o").is_err(), "{}", segment);
        }
    }

    #[test]
    fn test_resample_minimum() {
        let d = descriptor("l_r_2");
        assert_eq!(LayerParams::new(&d).unwrap().resample("r").unwrap(), Some(2));

        let d = descriptor("l_r_1");
        let err = LayerParams::new(&d).unwrap().resample("r").unwrap_err();
        assert!(reason(err).contains(">= 2"));
    }

    #[test]
    fn test_flag() {
        let d = descriptor("l_outline_1");
        assert!(LayerParams::new(&d).unwrap().flag("outline").unwrap());

        let d = descriptor("l_outline_yes");
        assert!(LayerParams::new(&d).unwrap().flag("outline").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let d = descriptor("slope_a_64_zz_1");
        let mut params = LayerParams::new(&d).unwrap();
        params.alpha("a").unwrap();

        let err = params.finish().unwrap_err();
        assert_eq!(
            err,
            TilespecError::InvalidParameter {
                segment: "slope_a_64_zz_1".to_string(),
                key: "zz".to_string(),
                value: "1".to_string(),
                reason: "unknown parameter for layer 'slope'".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let d = descriptor("slope_a_64_a_32");
        let err = LayerParams::new(&d).err().unwrap();
        assert!(reason(err).contains("more than once"));
    }
}
