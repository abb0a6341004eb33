// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document-level settings applied to an output PDF: metadata, viewer
// preferences, and encryption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// PDF header version, e.g. 1.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Catalog `/PageLayout` viewer preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLayout {
    #[default]
    SinglePage,
    OneColumn,
    TwoColumnLeft,
    TwoColumnRight,
    TwoPageLeft,
    TwoPageRight,
}

impl PageLayout {
    /// PDF name object value.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::SinglePage => "SinglePage",
            Self::OneColumn => "OneColumn",
            Self::TwoColumnLeft => "TwoColumnLeft",
            Self::TwoColumnRight => "TwoColumnRight",
            Self::TwoPageLeft => "TwoPageLeft",
            Self::TwoPageRight => "TwoPageRight",
        }
    }
}

/// Catalog `/PageMode` viewer preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    #[default]
    UseNone,
    UseOutlines,
    UseThumbs,
    FullScreen,
    UseOC,
    UseAttachments,
}

impl PageMode {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::UseNone => "UseNone",
            Self::UseOutlines => "UseOutlines",
            Self::UseThumbs => "UseThumbs",
            Self::FullScreen => "FullScreen",
            Self::UseOC => "UseOC",
            Self::UseAttachments => "UseAttachments",
        }
    }
}

/// Document information written to `/Info` plus viewer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub version: PdfVersion,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
    pub producer: String,
    pub layout: PageLayout,
    pub mode: PageMode,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: PdfVersion::default(),
            title: String::new(),
            author: String::new(),
            subject: String::new(),
            keywords: String::new(),
            creator: String::new(),
            producer: format!("Folio {}", env!("CARGO_PKG_VERSION")),
            layout: PageLayout::default(),
            mode: PageMode::default(),
            created: None,
            modified: None,
        }
    }
}

/// Cipher and key strength for output encryption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionMethod {
    /// RC4, 40-bit key.
    Standard40,
    /// RC4, 128-bit key.
    Standard128,
    /// AES-128 through a crypt filter (V4).
    Aes128,
    /// AES-256 with the revision 5 key derivation.
    #[default]
    Aes256,
    /// AES-256 with the revision 6 key derivation.
    Aes256r6,
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Standard40 => "RC4 40-bit",
            Self::Standard128 => "RC4 128-bit",
            Self::Aes128 => "AES 128-bit",
            Self::Aes256 => "AES 256-bit",
            Self::Aes256r6 => "AES 256-bit (r6)",
        };
        f.write_str(name)
    }
}

/// Bitmask of operations a reader of the output may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission(u32);

impl Permission {
    pub const PRINT: Permission = Permission(1 << 2);
    pub const MODIFY: Permission = Permission(1 << 3);
    pub const COPY: Permission = Permission(1 << 4);
    pub const ANNOTATE: Permission = Permission(1 << 5);
    pub const FILL_FORM: Permission = Permission(1 << 8);
    pub const ACCESSIBILITY: Permission = Permission(1 << 9);
    pub const ASSEMBLE: Permission = Permission(1 << 10);
    pub const PRINT_HIGH_QUALITY: Permission = Permission(1 << 11);

    pub const NONE: Permission = Permission(0);
    pub const ALL: Permission = Permission(
        Self::PRINT.0
            | Self::MODIFY.0
            | Self::COPY.0
            | Self::ANNOTATE.0
            | Self::FILL_FORM.0
            | Self::ACCESSIBILITY.0
            | Self::ASSEMBLE.0
            | Self::PRINT_HIGH_QUALITY.0,
    );

    /// Bits that the PDF standard security handler requires to be set.
    const RESERVED: u32 = 0xFFFF_F0C0;

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn allows(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: Permission) -> Self {
        Self(self.0 | other.0)
    }

    pub fn without(self, other: Permission) -> Self {
        Self(self.0 & !other.0)
    }

    /// Signed `/P` value as stored in the encryption dictionary.
    pub fn pdf_value(self) -> i32 {
        (Self::RESERVED | (self.0 & Self::ALL.0)) as i32
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        self.with(rhs)
    }
}

/// Encryption settings for an output PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encryption {
    pub enabled: bool,
    pub method: EncryptionMethod,
    pub owner_password: String,
    pub user_password: String,
    /// Require [`Encryption::user_password`] to open the document. When
    /// false the user password is left empty.
    pub open_with_password: bool,
    pub permission: Permission,
}

impl Encryption {
    /// User password that will actually be written.
    pub fn effective_user_password(&self) -> &str {
        if self.open_with_password {
            &self.user_password
        } else {
            ""
        }
    }
}
