/// CSS selectors and labels the calendar site is scraped by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteSelectors {
    pub phone_input: String,
    pub password_input: String,
    pub submit_button: String,
    pub schedule_link: String,
    pub date_input: String,
    pub date_picker: String,
    pub date_cell: String,
    /// Month name shown in the picker header.
    pub month_header: String,
    pub time_select: String,
    pub time_option: String,
    /// A real (non-placeholder) time option; its presence means the select has loaded.
    pub loaded_time_option: String,
    pub bookings_table: String,
    pub table_row: String,
    pub table_cell: String,
    /// Placeholder text of the time select.
    pub time_placeholder: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            phone_input: "#student-phone".to_owned(),
            password_input: "#student-password".to_owned(),
            submit_button: "button[type='submit']".to_owned(),
            schedule_link: "a.nav-link[href='/driving-record']".to_owned(),
            date_input: "#drivingschedule-date".to_owned(),
            date_picker: "#ui-datepicker-div".to_owned(),
            date_cell: "td[data-handler='selectDay'] a.ui-state-default".to_owned(),
            month_header: ".ui-datepicker-month".to_owned(),
            time_select: "#drivingschedule-id_time_period".to_owned(),
            time_option: "option".to_owned(),
            loaded_time_option: "#drivingschedule-id_time_period option[value]:not([value=''])"
                .to_owned(),
            bookings_table: "table.table-hover".to_owned(),
            table_row: "tr".to_owned(),
            table_cell: "td".to_owned(),
            time_placeholder: "Выберите время".to_owned(),
        }
    }
}
