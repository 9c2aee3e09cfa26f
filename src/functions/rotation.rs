use crate::functions::render::page_count;

/// Cursor de la página mostrada; avanza con cada tick y vuelve a la primera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    page: usize,
}

impl PageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.page
    }

    /// Pasa a la página siguiente de una lista de `len` entradas.
    pub fn advance(&mut self, len: usize, per_page: usize) -> usize {
        let pages = page_count(len, per_page);
        self.page = if pages == 0 { 0 } else { (self.page + 1) % pages };
        self.page
    }

    /// Reajusta el cursor cuando la lista encoge tras un refresco.
    pub fn clamp(&mut self, len: usize, per_page: usize) -> usize {
        if self.page >= page_count(len, per_page) {
            self.page = 0;
        }
        self.page
    }
}
