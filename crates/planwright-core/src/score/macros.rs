//! Declarative macros for reducing score type boilerplate.
//!
//! Every score type is a struct with an `init_score: i32` field followed by
//! one `i64` field per level. These macros generate the field-by-field
//! arithmetic, the scaling methods and slash-separated parsing.

/// Generates `Add`, `Sub`, and `Neg` for a field-based score type.
///
/// The init score takes part in all three operations.
///
/// # Usage
/// ```ignore
/// impl_score_ops!(HardSoftScore { hard, soft });
/// ```
macro_rules! impl_score_ops {
    ($type:ident { $($field:ident),+ }) => {
        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                $type {
                    init_score: self.init_score + other.init_score,
                    $($field: self.$field + other.$field),+
                }
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                $type {
                    init_score: self.init_score - other.init_score,
                    $($field: self.$field - other.$field),+
                }
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                $type {
                    init_score: -self.init_score,
                    $($field: -self.$field),+
                }
            }
        }
    };
}

/// Generates `init_score`, `with_init_score`, `multiply`, `divide`, and `abs`
/// for the `Score` trait impl.
///
/// Intended to be used *inside* an `impl Score for Type { ... }` block.
macro_rules! impl_score_scale {
    ($type:ident { $($field:ident),+ }) => {
        #[inline]
        fn init_score(&self) -> i32 {
            self.init_score
        }

        #[inline]
        fn with_init_score(&self, init_score: i32) -> Self {
            $type { init_score, ..*self }
        }

        fn multiply(&self, multiplicand: f64) -> Self {
            $type {
                init_score: self.init_score,
                $($field: (self.$field as f64 * multiplicand).round() as i64),+
            }
        }

        fn divide(&self, divisor: f64) -> Self {
            $type {
                init_score: self.init_score,
                $($field: (self.$field as f64 / divisor).round() as i64),+
            }
        }

        fn abs(&self) -> Self {
            $type {
                init_score: self.init_score,
                $($field: self.$field.abs()),+
            }
        }
    };
}

/// Generates `ParseableScore` for scores using the `"Xsuffix/Ysuffix"` format,
/// optionally prefixed by `"<n>init/"`.
///
/// # Usage
/// ```ignore
/// impl_score_parse!(HardSoftScore { hard => "hard", soft => "soft" });
/// ```
macro_rules! impl_score_parse {
    ($type:ident { $($field:ident => $suffix:literal),+ }) => {
        impl $crate::score::traits::ParseableScore for $type {
            fn parse(s: &str) -> Result<Self, $crate::score::traits::ScoreParseError> {
                let (init_score, rest) = $crate::score::traits::split_init_score(s)?;
                let parts: Vec<&str> = rest.split('/').collect();
                let suffixes: &[&str] = &[ $($suffix),+ ];

                if parts.len() != suffixes.len() {
                    return Err($crate::score::traits::ScoreParseError {
                        message: format!(
                            "Invalid {} format '{}': expected {} parts separated by '/'",
                            stringify!($type), s, suffixes.len()
                        ),
                    });
                }

                let mut _idx = 0usize;
                $(
                    let $field = {
                        let part = parts[_idx].trim();
                        let num_str = part.strip_suffix($suffix).ok_or_else(|| {
                            $crate::score::traits::ScoreParseError {
                                message: format!(
                                    "{} part '{}' must end with '{}'",
                                    stringify!($field), part, $suffix
                                ),
                            }
                        })?;
                        _idx += 1;
                        num_str.parse::<i64>().map_err(|e| {
                            $crate::score::traits::ScoreParseError {
                                message: format!("Invalid {} score '{}': {}", $suffix, num_str, e),
                            }
                        })?
                    };
                )+

                Ok($type { init_score, $($field),+ })
            }

            fn to_string_repr(&self) -> String {
                self.to_string()
            }
        }
    };
}
