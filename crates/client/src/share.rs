//! Social sharing links.

use hearth_core::catalog::Product;
use url::Url;

use crate::error::ApiError;

/// Supported share targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharePlatform {
    Vk,
    Telegram,
    WhatsApp,
    Odnoklassniki,
    Email,
}

impl SharePlatform {
    pub const ALL: [Self; 5] = [
        Self::Vk,
        Self::Telegram,
        Self::WhatsApp,
        Self::Odnoklassniki,
        Self::Email,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vk => "vk",
            Self::Telegram => "telegram",
            Self::WhatsApp => "whatsapp",
            Self::Odnoklassniki => "odnoklassniki",
            Self::Email => "email",
        }
    }
}

/// Public page URL of a product.
///
/// # Errors
///
/// Returns `ApiError::Url` if `base` cannot be joined.
pub fn product_url(base: &Url, product: &Product) -> Result<Url, ApiError> {
    Ok(base.join(&format!("product/{}", product.id))?)
}

/// Share link for `product` on `platform`.
#[must_use]
pub fn share_link(platform: SharePlatform, page: &Url, title: &str) -> String {
    let url = urlencoding::encode(page.as_str());
    let title = urlencoding::encode(title);
    match platform {
        SharePlatform::Vk => format!("https://vk.com/share.php?url={url}&title={title}"),
        SharePlatform::Telegram => format!("https://t.me/share/url?url={url}&text={title}"),
        SharePlatform::WhatsApp => format!("https://wa.me/?text={title}%20{url}"),
        SharePlatform::Odnoklassniki => {
            format!("https://connect.ok.ru/offer?url={url}&title={title}")
        }
        SharePlatform::Email => format!("mailto:?subject={title}&body={url}"),
    }
}
