//! Output files.
//!
//! ```text
//! data_dir/
//! ├── hpe_news.json                 # one per listing
//! ├── hpe_blog_articles.json
//! ├── all_scraped_articles.json     # latest combined list
//! └── all_scraped_articles_enhanced.json
//! output_dir/
//! └── all_scraped_articles_20251112_093000.json
//! debug_dir/
//! ├── debug_hpe-news_full_html.html
//! └── debug_hpe-news_extracted_html.html
//! ```

pub mod json;
