//! In-memory [`ProductStore`] for unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use pdash_core::ValidProduct;

use crate::upsert::ProductStore;

pub(crate) fn product(product_id: &str) -> ValidProduct {
    ValidProduct {
        product_id: product_id.to_string(),
        product_name: format!("Product {product_id}"),
        category: None,
        discounted_price: None,
        actual_price: None,
        discount_percentage: None,
        rating: None,
        rating_count: None,
        about_product: None,
        user_name: None,
        review_title: None,
        review_content: None,
    }
}

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<String, ValidProduct>,
    batch_sizes: Vec<usize>,
}

/// Keyed by `product_id`; a write replaces any existing entry. Calls listed
/// in `fail_calls` (zero-based) fail without writing anything.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    fail_calls: HashSet<usize>,
}

impl MemoryStore {
    pub(crate) fn failing_calls(calls: &[usize]) -> Self {
        Self {
            fail_calls: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().expect("lock").batch_sizes.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().expect("lock").products.len()
    }

    pub(crate) fn contains(&self, product_id: &str) -> bool {
        self.state
            .lock()
            .expect("lock")
            .products
            .contains_key(product_id)
    }

    pub(crate) fn get(&self, product_id: &str) -> Option<ValidProduct> {
        self.state
            .lock()
            .expect("lock")
            .products
            .get(product_id)
            .cloned()
    }
}

impl ProductStore for MemoryStore {
    type Error = String;

    async fn upsert_batch(&self, batch: &[ValidProduct]) -> Result<(), String> {
        let mut state = self.state.lock().expect("lock");
        let call = state.batch_sizes.len();
        state.batch_sizes.push(batch.len());
        if self.fail_calls.contains(&call) {
            return Err(format!("simulated failure on call {call}"));
        }
        for product in batch {
            state
                .products
                .insert(product.product_id.clone(), product.clone());
        }
        Ok(())
    }
}
