diesel::table! {
    cve_table (id) {
        id -> Text,
        #[sql_name = "desc"]
        description -> Text,
        pub_date -> Text,
        last_mod_date -> Text,
        score -> Nullable<Double>,
    }
}

diesel::table! {
    cpe_table (id) {
        id -> Text,
        product -> Text,
        vendor -> Text,
    }
}

diesel::table! {
    link (cve_id, cpe_match) {
        cve_id -> Text,
        cpe_match -> Text,
    }
}

diesel::joinable!(link -> cve_table (cve_id));
diesel::joinable!(link -> cpe_table (cpe_match));

diesel::allow_tables_to_appear_in_same_query!(cve_table, cpe_table, link,);
