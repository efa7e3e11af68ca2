use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EntryError;

/// エントリーのカテゴリ項目（形状、量、感覚、色）に共通するtrait。
///
/// 永続化や外部入力では整数コードとして扱い、変換時に範囲を検証する。
pub trait Category: Copy + Eq + fmt::Debug + 'static {
    /// 宣言順に並べた全ての値。統計の同数時の並び順にも利用する。
    const ALL: &'static [Self];

    /// エラーメッセージに利用する項目名。
    const FIELD: &'static str;

    /// 整数コードを返す。
    fn code(self) -> u8;

    /// 表示名を返す。
    fn name(self) -> &'static str;

    /// 整数コードから値を返す。範囲外の場合は`None`。
    fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|value| value.code() == code)
    }

    /// 整数コードを検証して値に変換する。
    fn parse_code(code: u8) -> Result<Self, EntryError> {
        Self::from_code(code).ok_or_else(|| {
            EntryError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                Self::FIELD,
                Self::ALL.len(),
                code
            ))
        })
    }
}

/// ブリストルスケールによる形状の分類。硬いものから水様のものへ並ぶ。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BristolType {
    Type1,
    Type2,
    Type3,
    Type4,
    Type5,
    Type6,
    Type7,
}

impl BristolType {
    pub fn description(self) -> &'static str {
        match self {
            Self::Type1 => "Separate hard lumps, like nuts (hard to pass)",
            Self::Type2 => "Sausage-shaped, but lumpy",
            Self::Type3 => "Like a sausage but with cracks on its surface",
            Self::Type4 => "Like a sausage or snake, smooth and soft",
            Self::Type5 => "Soft blobs with clear cut edges (passed easily)",
            Self::Type6 => "Fluffy pieces with ragged edges, a mushy stool",
            Self::Type7 => "Watery, no solid pieces, entirely liquid",
        }
    }
}

impl Category for BristolType {
    const ALL: &'static [Self] = &[
        Self::Type1,
        Self::Type2,
        Self::Type3,
        Self::Type4,
        Self::Type5,
        Self::Type6,
        Self::Type7,
    ];
    const FIELD: &'static str = "type";

    fn code(self) -> u8 {
        match self {
            Self::Type1 => 1,
            Self::Type2 => 2,
            Self::Type3 => 3,
            Self::Type4 => 4,
            Self::Type5 => 5,
            Self::Type6 => 6,
            Self::Type7 => 7,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Type1 => "Type 1",
            Self::Type2 => "Type 2",
            Self::Type3 => "Type 3",
            Self::Type4 => "Type 4",
            Self::Type5 => "Type 5",
            Self::Type6 => "Type 6",
            Self::Type7 => "Type 7",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Volume {
    Small,
    Medium,
    Large,
}

impl Category for Volume {
    const ALL: &'static [Self] = &[Self::Small, Self::Medium, Self::Large];
    const FIELD: &'static str = "volume";

    fn code(self) -> u8 {
        match self {
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Feeling {
    Easy,
    Moderate,
    Difficult,
    Incomplete,
}

impl Feeling {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Easy => "😌",
            Self::Moderate => "😐",
            Self::Difficult => "😣",
            Self::Incomplete => "😕",
        }
    }
}

impl Category for Feeling {
    const ALL: &'static [Self] = &[Self::Easy, Self::Moderate, Self::Difficult, Self::Incomplete];
    const FIELD: &'static str = "feeling";

    fn code(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Moderate => 2,
            Self::Difficult => 3,
            Self::Incomplete => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Difficult => "Difficult",
            Self::Incomplete => "Incomplete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StoolColor {
    Brown,
    DarkBrown,
    LightBrown,
    Yellow,
    Green,
    Red,
    Black,
}

impl StoolColor {
    /// 表示用の色コードを返す。
    pub fn hex(self) -> &'static str {
        match self {
            Self::Brown => "#8B4513",
            Self::DarkBrown => "#5D4037",
            Self::LightBrown => "#A0522D",
            Self::Yellow => "#FFC107",
            Self::Green => "#4CAF50",
            Self::Red => "#F44336",
            Self::Black => "#212121",
        }
    }
}

impl Category for StoolColor {
    const ALL: &'static [Self] = &[
        Self::Brown,
        Self::DarkBrown,
        Self::LightBrown,
        Self::Yellow,
        Self::Green,
        Self::Red,
        Self::Black,
    ];
    const FIELD: &'static str = "color";

    fn code(self) -> u8 {
        match self {
            Self::Brown => 1,
            Self::DarkBrown => 2,
            Self::LightBrown => 3,
            Self::Yellow => 4,
            Self::Green => 5,
            Self::Red => 6,
            Self::Black => 7,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Brown => "Brown",
            Self::DarkBrown => "Dark Brown",
            Self::LightBrown => "Light Brown",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Red => "Red",
            Self::Black => "Black",
        }
    }
}

// serdeの`try_from`/`into`で整数コードとして読み書きするための変換。
macro_rules! impl_code_conversions {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<u8> for $ty {
                type Error = EntryError;

                fn try_from(code: u8) -> Result<Self, Self::Error> {
                    <$ty as Category>::parse_code(code)
                }
            }

            impl From<$ty> for u8 {
                fn from(value: $ty) -> u8 {
                    value.code()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

impl_code_conversions!(BristolType, Volume, Feeling, StoolColor);
