//! Catalog page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use hearth_core::catalog::{Product, ProductFilter};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::filters;
use crate::state::AppState;

/// Catalog page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub category: Option<String>,
}

/// Server-rendered catalog page.
#[derive(Template, WebTemplate)]
#[template(
    ext = "html",
    source = r#"<!doctype html>
<html lang="ru">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Каталог котлов</title>
</head>
<body>
  <header>
    <h1>Каталог</h1>
    <nav>
      <a href="/"{% if selected.is_none() %} aria-current="page"{% endif %}>Все</a>
      {% for category in categories %}
      <a href="/?category={{ category|urlencode }}"{% if selected.as_deref() == Some(category.as_str()) %} aria-current="page"{% endif %}>{{ category }}</a>
      {% endfor %}
    </nav>
  </header>
  <main>
    {% if products.is_empty() %}
    <p>Товары не найдены</p>
    {% else %}
    <ul class="products">
      {% for product in products %}
      <li class="product" data-id="{{ product.id }}">
        {% if let Some(url) = product.image_url.as_deref() %}<img src="{{ url }}" alt="{{ product.name }}" loading="lazy">{% endif %}
        <h2>{{ product.name }}</h2>
        <p class="price">{{ product.price|rubles }}</p>
        {% if product.in_stock %}<p class="stock">В наличии</p>{% else %}<p class="stock out">Под заказ</p>{% endif %}
      </li>
      {% endfor %}
    </ul>
    {% endif %}
  </main>
  <footer>&copy; {{ ""|current_year }}</footer>
</body>
</html>"#
)]
pub struct HomeTemplate {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub selected: Option<String>,
}

/// Display the catalog page, optionally narrowed to one category.
///
/// Database failures render an empty page rather than an error.
#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    let repo = ProductRepository::new(state.pool());
    let selected = query.category.filter(|c| !c.trim().is_empty());

    let filter = selected
        .as_deref()
        .map_or_else(ProductFilter::default, ProductFilter::category);

    let products = match repo.list(&filter).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Failed to load catalog page products: {e}");
            Vec::new()
        }
    };

    let categories = match repo.categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("Failed to load categories: {e}");
            Vec::new()
        }
    };

    HomeTemplate {
        products,
        categories,
        selected,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use hearth_core::ProductId;
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            article: Some("A-7".to_string()),
            name: "Котел Navien Deluxe 24K".to_string(),
            description: String::new(),
            price: Decimal::new(45_990, 0),
            category: "газовые котлы".to_string(),
            image_url: Some("/static/images/navien.jpg".to_string()),
            specifications: BTreeMap::new(),
            in_stock: true,
            stock_quantity: 3,
            views_count: 0,
            updated_at: None,
        }
    }

    #[test]
    fn test_renders_products_and_categories() {
        let html = HomeTemplate {
            products: vec![product()],
            categories: vec!["газовые котлы".to_string(), "электрокотлы".to_string()],
            selected: Some("газовые котлы".to_string()),
        }
        .render()
        .unwrap();

        assert!(html.contains("Котел Navien Deluxe 24K"));
        assert!(html.contains("45 990 ₽"));
        assert!(html.contains("data-id=\"7\""));
        assert!(html.contains("aria-current=\"page\">газовые котлы"));
    }

    #[test]
    fn test_renders_empty_state() {
        let html = HomeTemplate {
            products: Vec::new(),
            categories: Vec::new(),
            selected: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Товары не найдены"));
    }
}
