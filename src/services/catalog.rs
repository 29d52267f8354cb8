//! Catalog service: book CRUD and CSV bulk import

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, BookRequest, ImportReport, ImportedBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a book by id
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a batch of books
    pub async fn create_books(&self, requests: Vec<BookRequest>) -> AppResult<Vec<Book>> {
        let mut created = Vec::with_capacity(requests.len());
        for request in &requests {
            created.push(self.repository.books.create(request).await?);
        }
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i64, request: BookRequest) -> AppResult<Book> {
        self.repository.books.update(id, &request).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i64) -> AppResult<String> {
        self.repository.books.delete(id).await?;
        Ok(format!("Book with id {} has been successfully deleted.", id))
    }

    /// Search books by keyword
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Parse a semicolon-separated CSV catalog and persist the valid rows.
    ///
    /// Per-cell problems are collected into the report rather than aborting
    /// the whole import; rows that parsed cleanly are saved in one batch.
    pub async fn import_csv(&self, data: &[u8]) -> AppResult<ImportReport> {
        let mut report = ImportReport::default();
        let books = parse_csv(data, &mut report.errors);

        if books.is_empty() {
            if report.errors.is_empty() {
                report.errors.push("No data found in CSV file".to_string());
            }
            return Ok(report);
        }

        report.imported = self.repository.books.save_imported(&books).await?;

        tracing::info!(
            "CSV import: {} books saved, {} errors",
            report.imported,
            report.errors.len()
        );

        Ok(report)
    }
}

/// Parse CSV bytes into importable book rows.
///
/// Expects a header row; recognized columns (any order) are id, title,
/// author, isbn, quantity. Separator is ';' to match the legacy export
/// format.
fn parse_csv(data: &[u8], errors: &mut Vec<String>) -> Vec<ImportedBook> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_lowercase()).collect(),
        Err(e) => {
            errors.push(format!("Error processing CSV file: {}", e));
            return Vec::new();
        }
    };

    for header in &headers {
        if !matches!(header.as_str(), "id" | "title" | "author" | "isbn" | "quantity") {
            errors.push(format!("Invalid header: {}", header));
        }
    }

    let mut books = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("Error reading line {}: {}", line + 2, e));
                continue;
            }
        };

        let mut book = ImportedBook::default();
        let mut row_ok = true;

        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or_default().trim();
            match header.as_str() {
                "id" => {
                    if !value.is_empty() {
                        match value.parse::<i64>() {
                            Ok(id) if id > 0 => book.id = Some(id),
                            Ok(_) => {
                                errors.push(format!(
                                    "Invalid value for id: {}. ID must be a positive integer.",
                                    value
                                ));
                                row_ok = false;
                            }
                            Err(_) => {
                                errors.push(format!(
                                    "Invalid value for id: {}. ID must be a number.",
                                    value
                                ));
                                row_ok = false;
                            }
                        }
                    }
                }
                "title" => book.title = non_empty(value),
                "author" => book.author = non_empty(value),
                "isbn" => book.isbn = non_empty(value),
                "quantity" => {
                    if !value.is_empty() {
                        match value.parse::<i32>() {
                            Ok(q) if q >= 0 => book.quantity = q,
                            Ok(_) => {
                                errors.push(format!(
                                    "Invalid value for quantity: {}. Quantity must be a non-negative integer.",
                                    value
                                ));
                                row_ok = false;
                            }
                            Err(_) => {
                                errors.push(format!(
                                    "Invalid value for quantity: {}. Quantity must be a number.",
                                    value
                                ));
                                row_ok = false;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if row_ok {
            books.push(book);
        }
    }

    books
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_rows() {
        let data = b"title;author;isbn;quantity\nDune;Herbert;9780441013593;3\nSolaris;Lem;9780156027601;1\n";
        let mut errors = Vec::new();
        let books = parse_csv(data, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title.as_deref(), Some("Dune"));
        assert_eq!(books[0].quantity, 3);
        assert_eq!(books[1].author.as_deref(), Some("Lem"));
    }

    #[test]
    fn headers_in_any_order_and_explicit_id() {
        let data = b"quantity;id;title\n5;42;Dune\n";
        let mut errors = Vec::new();
        let books = parse_csv(data, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, Some(42));
        assert_eq!(books[0].quantity, 5);
    }

    #[test]
    fn rejects_negative_quantity_and_bad_id() {
        let data = b"id;title;quantity\n-1;Dune;3\nx;Solaris;2\n7;Ubik;-4\n";
        let mut errors = Vec::new();
        let books = parse_csv(data, &mut errors);

        assert!(books.is_empty());
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("positive integer"));
        assert!(errors[1].contains("must be a number"));
        assert!(errors[2].contains("non-negative"));
    }

    #[test]
    fn flags_unknown_headers() {
        let data = b"title;publisher\nDune;Ace\n";
        let mut errors = Vec::new();
        let books = parse_csv(data, &mut errors);

        // The row itself still parses; the unknown column is reported
        assert_eq!(books.len(), 1);
        assert!(errors.iter().any(|e| e.contains("Invalid header: publisher")));
    }

    #[test]
    fn empty_file_yields_nothing() {
        let mut errors = Vec::new();
        let books = parse_csv(b"", &mut errors);
        assert!(books.is_empty());
    }
}
