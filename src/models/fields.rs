//! Catalog column names
//!
//! Names follow the product CSV export of the hosted commerce platform.

pub const HANDLE: &str = "Handle";
pub const TITLE: &str = "Title";
pub const BODY_HTML: &str = "Body (HTML)";
pub const VENDOR: &str = "Vendor";
pub const PRODUCT_CATEGORY: &str = "Product Category";
pub const TYPE: &str = "Type";
pub const TAGS: &str = "Tags";
pub const PUBLISHED: &str = "Published";
pub const OPTION1_NAME: &str = "Option1 Name";
pub const OPTION1_VALUE: &str = "Option1 Value";
pub const OPTION2_NAME: &str = "Option2 Name";
pub const OPTION2_VALUE: &str = "Option2 Value";
pub const OPTION3_NAME: &str = "Option3 Name";
pub const OPTION3_VALUE: &str = "Option3 Value";
pub const VARIANT_SKU: &str = "Variant SKU";
pub const VARIANT_GRAMS: &str = "Variant Grams";
pub const VARIANT_INVENTORY_TRACKER: &str = "Variant Inventory Tracker";
pub const VARIANT_INVENTORY_QTY: &str = "Variant Inventory Qty";
pub const VARIANT_INVENTORY_POLICY: &str = "Variant Inventory Policy";
pub const VARIANT_FULFILLMENT_SERVICE: &str = "Variant Fulfillment Service";
pub const VARIANT_PRICE: &str = "Variant Price";
pub const VARIANT_COMPARE_AT_PRICE: &str = "Variant Compare At Price";
pub const VARIANT_REQUIRES_SHIPPING: &str = "Variant Requires Shipping";
pub const VARIANT_TAXABLE: &str = "Variant Taxable";
pub const VARIANT_BARCODE: &str = "Variant Barcode";
pub const VARIANT_WEIGHT_UNIT: &str = "Variant Weight Unit";
pub const IMAGE_SRC: &str = "Image Src";
pub const IMAGE_POSITION: &str = "Image Position";
pub const IMAGE_ALT_TEXT: &str = "Image Alt Text";
pub const GIFT_CARD: &str = "Gift Card";
pub const SEO_TITLE: &str = "SEO Title";
pub const SEO_DESCRIPTION: &str = "SEO Description";
pub const STATUS: &str = "Status";

/// Column order of a standard product export.
pub const STANDARD_HEADER: &[&str] = &[
    HANDLE,
    TITLE,
    BODY_HTML,
    VENDOR,
    PRODUCT_CATEGORY,
    TYPE,
    TAGS,
    PUBLISHED,
    OPTION1_NAME,
    OPTION1_VALUE,
    OPTION2_NAME,
    OPTION2_VALUE,
    OPTION3_NAME,
    OPTION3_VALUE,
    VARIANT_SKU,
    VARIANT_GRAMS,
    VARIANT_INVENTORY_TRACKER,
    VARIANT_INVENTORY_QTY,
    VARIANT_INVENTORY_POLICY,
    VARIANT_FULFILLMENT_SERVICE,
    VARIANT_PRICE,
    VARIANT_COMPARE_AT_PRICE,
    VARIANT_REQUIRES_SHIPPING,
    VARIANT_TAXABLE,
    VARIANT_BARCODE,
    IMAGE_SRC,
    IMAGE_POSITION,
    IMAGE_ALT_TEXT,
    GIFT_CARD,
    SEO_TITLE,
    SEO_DESCRIPTION,
    VARIANT_WEIGHT_UNIT,
    STATUS,
];
