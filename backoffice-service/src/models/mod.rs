pub mod access;
pub mod appointment;
pub mod catalog;
pub mod finance;
pub mod people;
pub mod sales;
pub mod user;

pub use access::{IdentifierType, Permission, Role, RoleWithPermissions, UserStateType, UserType};
pub use appointment::{Appointment, AppointmentFields, HourSlot};
pub use catalog::{HistoricalItemPrice, Item, ItemFields, ItemType, StockCheck};
pub use finance::{
    AdditionalExpense, AdditionalExpenseFields, ExternalSale, ExternalSaleFields, SalesFigures,
    SalesReport,
};
pub use people::{Comment, CommentFields, Customer, CustomerFields, Employee, EmployeeFields};
pub use sales::{
    Adjustment, AdjustmentFields, DiscountType, Invoice, LineItem, NewInvoice, NewPurchaseOrder,
    OrderStateType, PricedLine, PurchaseOrder, PurchaseOrderChanges, StateChange, StoredLine,
    TaxType,
};
pub use user::{LogEntry, NewUser, User, UserChanges};
